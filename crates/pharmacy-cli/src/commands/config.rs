//! Configuration inspection commands.

use clap::{Args, Subcommand};

use pharmacy_core::error::AppError;
use pharmacy_database::connection::mask_password;

use super::Context;
use crate::output;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration
    Show,
    /// Load and validate the configuration
    Validate,
}

pub async fn execute(args: &ConfigArgs, ctx: &Context) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(ctx)?;
            config.database.url = mask_password(&config.database.url);
            output::print_item(&config, ctx.format);
        }
        ConfigCommand::Validate => match super::load_config(ctx) {
            Ok(config) => {
                output::print_success(&format!(
                    "Configuration '{}' (env: {}) is valid",
                    ctx.config_path, ctx.env
                ));
                output::print_kv("Database", &mask_password(&config.database.url));
                output::print_kv("Scheduler enabled", &config.scheduler.enabled.to_string());
                output::print_kv("Business hours", &config.scheduler.business_hours_cron);
                output::print_kv("Off hours", &config.scheduler.off_hours_cron);
                output::print_kv(
                    "Significant sale",
                    &format!(
                        "{} {}",
                        config.alerting.significant_sale_amount, config.alerting.currency
                    ),
                );
                output::print_kv(
                    "Retention",
                    &format!("{} days", config.alerting.retention_days),
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
    }

    Ok(())
}
