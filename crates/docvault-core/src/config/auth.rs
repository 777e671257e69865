//! Password reset configuration.

use serde::{Deserialize, Serialize};

/// Password reset token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of an issued reset code, in minutes.
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reset_token_ttl_minutes: default_reset_token_ttl(),
        }
    }
}

fn default_reset_token_ttl() -> i64 {
    15
}
