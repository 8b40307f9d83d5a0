//! Database migration management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use pharmacy_core::error::AppError;
use pharmacy_database::migration::{self, MigrationState};

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show migration status
    Status,
}

#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    #[tabled(rename = "Version")]
    version: i64,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<MigrationState> for MigrationRow {
    fn from(state: MigrationState) -> Self {
        Self {
            version: state.version,
            description: state.description,
            status: if state.applied { "applied" } else { "pending" },
        }
    }
}

pub async fn execute(args: &MigrateArgs, ctx: &Context) -> Result<(), AppError> {
    let config = super::load_config(ctx)?;
    let db = super::connect(&config).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            migration::run_migrations(db.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Status => {
            let rows: Vec<MigrationRow> = migration::migration_status(db.pool())
                .await?
                .into_iter()
                .map(MigrationRow::from)
                .collect();
            output::print_list(&rows, ctx.format);
        }
    }

    db.close().await;
    Ok(())
}
