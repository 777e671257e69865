//! CLI command definitions and dispatch.

pub mod batch;
pub mod config;
pub mod exec;
pub mod reset;
pub mod user;

use std::str::FromStr;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::types::id::UserId;
use docvault_service::Services;

/// DocVault: multi-user document store
#[derive(Debug, Parser)]
#[command(name = "docvault", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load from `config/<env>.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one operation
    Exec(exec::ExecArgs),
    /// Run a file of operations, one JSON object per line
    Batch(batch::BatchArgs),
    /// User management
    User(user::UserArgs),
    /// Password reset codes
    Reset(reset::ResetArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Exec(args) => exec::execute(args, config, self.format).await,
            Commands::Batch(args) => batch::execute(args, config, self.format).await,
            Commands::User(args) => user::execute(args, config, self.format).await,
            Commands::Reset(args) => reset::execute(args, config, self.format).await,
            Commands::Config(args) => config::execute(args, config, self.format).await,
        }
    }
}

/// Helper: open the configured stores and wire the services
pub async fn open_services(config: &AppConfig) -> Result<Services, AppError> {
    Services::open(config).await
}

/// Helper: persist the record store after a mutating command
pub async fn persist(services: &Services) -> Result<(), AppError> {
    services.db.flush().await
}

/// Helper: parse a user ID argument
pub fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    UserId::from_str(raw.trim())
        .map_err(|e| {
            AppError::validation(format!("Invalid user id '{}': {}", raw, e))
        })
}
