//! Configuration CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Check that the configured stores can be opened
    Check,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => output::print_item(config, format),
        ConfigCommand::Check => {
            let services = super::open_services(config).await?;
            services.db.health_check().await?;
            output::print_success("Configuration is usable");
            output::print_kv("Blob root", &config.storage.root_path);
            output::print_kv(
                "Snapshot",
                config
                    .database
                    .snapshot_path
                    .as_deref()
                    .unwrap_or("(in memory)"),
            );
        }
    }
    Ok(())
}
