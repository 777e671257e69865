//! Password reset code CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;

/// Arguments for reset commands
#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Reset subcommand
    #[command(subcommand)]
    pub command: ResetCommand,
}

/// Reset subcommands
#[derive(Debug, Subcommand)]
pub enum ResetCommand {
    /// Issue a code for an account
    Issue {
        /// Email of the account
        email: String,
    },
    /// Redeem a code
    Redeem {
        /// The code
        code: String,
    },
}

/// Execute reset commands
pub async fn execute(
    args: &ResetArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::open_services(config).await?;

    match &args.command {
        ResetCommand::Issue { email } => {
            let token = services.resets.issue(email).await?;
            super::persist(&services).await?;
            match format {
                OutputFormat::Json => output::print_item(&token, format),
                OutputFormat::Table => {
                    output::print_success(&format!("Reset code issued for '{}'", email));
                    output::print_kv("Code", &token.code);
                    output::print_kv("Expires", &token.expires_at.to_rfc3339());
                }
            }
        }
        ResetCommand::Redeem { code } => {
            let user_id = services.resets.redeem(code).await?;
            super::persist(&services).await?;
            output::print_success("Reset code accepted");
            output::print_kv("User", &user_id.to_string());
        }
    }

    Ok(())
}
