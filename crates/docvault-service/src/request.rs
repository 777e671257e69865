//! Request payload validation.

use validator::Validate;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;

/// Runs the derived field rules of `request`, mapping failures to a
/// validation error.
pub fn validate<T: Validate>(request: &T) -> AppResult<()> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Trims `value`, failing with a validation error naming `field` when
/// nothing is left.
pub fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
