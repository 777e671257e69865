//! Issuing and redeeming password reset codes.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use docvault_core::config::auth::AuthConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_database::repositories::{ResetTokenRepository, UserRepository};
use docvault_entity::token::PasswordResetToken;

/// Attempts at drawing a code not currently held by another token.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Issues and redeems reset codes. Credential changes happen elsewhere;
/// redemption only proves the caller holds a live code.
#[derive(Debug, Clone)]
pub struct PasswordResetService {
    tokens: Arc<ResetTokenRepository>,
    users: Arc<UserRepository>,
    ttl: Duration,
}

impl PasswordResetService {
    /// Creates a new reset service.
    pub fn new(
        tokens: Arc<ResetTokenRepository>,
        users: Arc<UserRepository>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            tokens,
            users,
            ttl: Duration::minutes(config.reset_token_ttl_minutes),
        }
    }

    /// Issue a fresh code for the user registered under `email`.
    pub async fn issue(&self, email: &str) -> AppResult<PasswordResetToken> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let token = PasswordResetToken::issue(user.id, self.ttl);
            if self.tokens.find_by_code(&token.code).await?.is_some() {
                continue;
            }
            self.tokens.insert_one(&token).await?;
            info!(user_id = %user.id, expires_at = %token.expires_at, "Password reset code issued");
            return Ok(token);
        }

        warn!(user_id = %user.id, "No free reset code found");
        Err(AppError::unavailable(
            "Could not allocate a reset code, try again later",
        ))
    }

    /// Redeem `code`, deleting it and returning the user it was issued for.
    ///
    /// Unknown and expired codes are rejected as invalid input; an expired
    /// code is left in place.
    pub async fn redeem(&self, code: &str) -> AppResult<UserId> {
        let code = code.trim().to_uppercase();
        let token = self
            .tokens
            .find_by_code(&code)
            .await?
            .ok_or_else(|| AppError::validation("Invalid reset code"))?;

        if token.is_expired_at(Utc::now()) {
            return Err(AppError::validation("Reset code has expired"));
        }

        let taken = self
            .tokens
            .take_by_code(&code)
            .await?
            .ok_or_else(|| AppError::validation("Invalid reset code"))?;

        info!(user_id = %taken.user_id, "Password reset code redeemed");
        Ok(taken.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::error::ErrorKind;
    use docvault_database::Database;
    use docvault_entity::user::{CreateUser, User};

    async fn setup(ttl_minutes: i64) -> (PasswordResetService, User) {
        let db = Database::in_memory();
        let users = Arc::new(UserRepository::new(db.clone()));
        let user = User::create(CreateUser {
            email: "rita@example.com".into(),
            first_name: "Rita".into(),
            last_name: String::new(),
        });
        users.insert_one(&user).await.unwrap();
        let service = PasswordResetService::new(
            Arc::new(ResetTokenRepository::new(db)),
            users,
            &AuthConfig {
                reset_token_ttl_minutes: ttl_minutes,
            },
        );
        (service, user)
    }

    #[tokio::test]
    async fn test_issue_and_redeem_once() {
        let (service, user) = setup(15).await;
        let token = service.issue("RITA@example.com").await.unwrap();
        assert_eq!(token.user_id, user.id);

        let redeemed = service.redeem(&token.code.to_lowercase()).await.unwrap();
        assert_eq!(redeemed, user.id);

        let err = service.redeem(&token.code).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let (service, _) = setup(-1).await;
        let token = service.issue("rita@example.com").await.unwrap();
        let err = service.redeem(&token.code).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("expired"));
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let (service, _) = setup(15).await;
        let err = service.issue("nobody@example.com").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
