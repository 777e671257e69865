//! Batch execution of operations from a JSON lines file.

use std::sync::Arc;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::types::Outcome;
use docvault_core::types::id::UserId;
use docvault_service::Dispatcher;

/// Arguments for `batch`
#[derive(Debug, Args)]
pub struct BatchArgs {
    /// File with one `{"actor": ..., "operation": {...}}` object per line
    pub file: String,

    /// Stop at the first failed line
    #[arg(long)]
    pub fail_fast: bool,
}

/// One line of a batch file
#[derive(Debug, Deserialize)]
struct BatchLine {
    actor: UserId,
    operation: Value,
}

/// Result row for table output
#[derive(Debug, Serialize, Tabled)]
struct BatchRow {
    /// Line number
    line: usize,
    /// Operation tag
    op: String,
    /// ok or error
    status: String,
    /// Error code and message, if any
    detail: String,
}

/// Execute every line in order, then persist once
pub async fn execute(
    args: &BatchArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| {
            AppError::internal(format!("Failed to read '{}': {}", args.file, e))
        })?;

    let services = super::open_services(config).await?;
    let dispatcher = Dispatcher::new(Arc::new(services));
    let mut rows = Vec::new();
    let mut failures = 0usize;

    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (op, outcome) = match serde_json::from_str::<BatchLine>(line) {
            Ok(entry) => {
                let op = entry
                    .operation
                    .get("op")
                    .and_then(Value::as_str)
                    .unwrap_or("?")
                    .to_string();
                (op, dispatcher.dispatch_json(entry.actor, entry.operation).await)
            }
            Err(e) => (
                "?".to_string(),
                AppError::validation(format!("Malformed batch line: {}", e)).into(),
            ),
        };

        let row = match &outcome {
            Outcome::Ok { .. } => BatchRow {
                line: idx + 1,
                op,
                status: "ok".to_string(),
                detail: String::new(),
            },
            Outcome::Error { error, message } => {
                failures += 1;
                BatchRow {
                    line: idx + 1,
                    op,
                    status: "error".to_string(),
                    detail: format!("{}: {}", error, message),
                }
            }
        };
        rows.push(row);

        if args.fail_fast && failures > 0 {
            break;
        }
    }

    super::persist(dispatcher.services()).await?;
    output::print_list(&rows, format);
    if failures > 0 {
        output::print_warning(&format!("{} of {} operations failed", failures, rows.len()));
    }
    Ok(())
}
