//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod notifications;

use clap::{Parser, Subcommand};

use pharmacy_core::config::AppConfig;
use pharmacy_core::error::AppError;
use pharmacy_database::DatabasePool;
use pharmacy_service::{Services, Stores};

use crate::output::OutputFormat;

/// Pharmacy back-office alerting administration
#[derive(Debug, Parser)]
#[command(name = "pharmacy-cli", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without extension
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from config/<env>.toml
    #[arg(short, long, global = true, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Debug logging and extra report sections
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Alert checks, test scenarios, reports and cleanup
    Notifications(notifications::NotificationsArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: String,
    pub env: String,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl Cli {
    pub async fn execute(&self) -> Result<(), AppError> {
        let ctx = Context {
            config_path: self.config.clone(),
            env: self.env.clone(),
            format: self.format,
            verbose: self.verbose,
        };

        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &ctx).await,
            Commands::Notifications(args) => notifications::execute(args, &ctx).await,
            Commands::Config(args) => config::execute(args, &ctx).await,
        }
    }
}

/// Helper: load configuration for the selected environment
pub fn load_config(ctx: &Context) -> Result<AppConfig, AppError> {
    AppConfig::load_from(&ctx.config_path, &ctx.env)
}

/// Helper: open the database pool from config
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire every service over PostgreSQL
pub async fn build_services(config: &AppConfig, db: &DatabasePool) -> (Stores, Services) {
    let stores = Stores::from_pool(db);
    let services = Services::build(stores.clone(), config.alerting.clone()).await;
    (stores, services)
}
