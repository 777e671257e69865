//! Result envelope returned across the operation boundary.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// Tagged outcome of a dispatched operation.
///
/// Serializes as `{"status": "ok", "data": ...}` or
/// `{"status": "error", "error": "NOT_FOUND", "message": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// The operation succeeded.
    Ok {
        /// Operation result.
        data: serde_json::Value,
    },
    /// The operation failed.
    Error {
        /// Machine-readable error code.
        error: String,
        /// Human-readable message.
        message: String,
    },
}

impl Outcome {
    /// Whether this outcome is a success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The error code, when this outcome is a failure.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Error { error, .. } => Some(error),
        }
    }
}

impl From<AppError> for Outcome {
    fn from(err: AppError) -> Self {
        Self::Error {
            error: err.kind.to_string(),
            message: err.message,
        }
    }
}

impl From<AppResult<serde_json::Value>> for Outcome {
    fn from(result: AppResult<serde_json::Value>) -> Self {
        match result {
            Ok(data) => Self::Ok { data },
            Err(err) => err.into(),
        }
    }
}

impl From<Outcome> for AppResult<serde_json::Value> {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ok { data } => Ok(data),
            Outcome::Error { error, message } => {
                let kind = match error.as_str() {
                    "NOT_FOUND" => ErrorKind::NotFound,
                    "FORBIDDEN" => ErrorKind::Forbidden,
                    "CONFLICT" => ErrorKind::Conflict,
                    "VALIDATION" => ErrorKind::Validation,
                    "UNAVAILABLE" => ErrorKind::Unavailable,
                    "DATABASE" => ErrorKind::Database,
                    "STORAGE" => ErrorKind::Storage,
                    "CONFIGURATION" => ErrorKind::Configuration,
                    "SERIALIZATION" => ErrorKind::Serialization,
                    _ => ErrorKind::Internal,
                };
                Err(AppError::new(kind, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let outcome = Outcome::from(AppError::conflict("cannot share with yourself"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "CONFLICT");
        assert_eq!(json["message"], "cannot share with yourself");
    }

    #[test]
    fn test_ok_envelope_shape() {
        let outcome = Outcome::from(Ok(serde_json::json!({"is_favorite": true})));
        assert!(outcome.is_ok());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["is_favorite"], true);
    }

    #[test]
    fn test_back_to_result() {
        let outcome = Outcome::from(AppError::not_found("Document not found"));
        let result: AppResult<serde_json::Value> = outcome.into();
        assert_eq!(result.unwrap_err().kind, ErrorKind::NotFound);
    }
}
