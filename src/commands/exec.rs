//! Single operation execution.

use std::sync::Arc;

use clap::Args;
use serde_json::Value;

use crate::output::{self, OutputFormat};
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_service::Dispatcher;

/// Arguments for `exec`
#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Acting user ID
    #[arg(short, long)]
    pub actor: String,

    /// Operation as JSON, e.g. '{"op": "list_documents"}'
    pub operation: String,
}

/// Execute one operation and print its result
pub async fn execute(
    args: &ExecArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let actor = super::parse_user_id(&args.actor)?;
    let payload: Value = serde_json::from_str(&args.operation)
        .map_err(|e| {
            AppError::validation(format!("Operation is not valid JSON: {}", e))
        })?;

    let services = super::open_services(config).await?;
    let dispatcher = Dispatcher::new(Arc::new(services));
    let outcome = dispatcher.dispatch_json(actor, payload).await;
    super::persist(dispatcher.services()).await?;

    let result: AppResult<Value> = outcome.into();
    output::print_item(&result?, format);
    Ok(())
}
