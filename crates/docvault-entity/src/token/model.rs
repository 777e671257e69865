//! Password reset token entity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docvault_core::types::id::{ResetTokenId, UserId};

/// Length of an issued reset code.
pub const CODE_LENGTH: usize = 4;

/// A single-use reset code bound to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    /// Unique token identifier.
    pub id: ResetTokenId,
    /// The user the code was issued for.
    pub user_id: UserId,
    /// Uppercase hexadecimal code.
    pub code: String,
    /// When the code was issued.
    pub created_at: DateTime<Utc>,
    /// When the code stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Issue a fresh code for `user_id` living for `ttl`.
    pub fn issue(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        let code: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(CODE_LENGTH)
            .collect::<String>()
            .to_uppercase();
        Self {
            id: ResetTokenId::new(),
            user_id,
            code,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Check if the code has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
