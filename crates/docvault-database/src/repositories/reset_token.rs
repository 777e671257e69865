//! Password reset token repository implementation.

use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_entity::token::PasswordResetToken;

use crate::connection::Database;

/// Repository for single-use reset codes.
#[derive(Debug, Clone)]
pub struct ResetTokenRepository {
    db: Database,
}

impl ResetTokenRepository {
    /// Create a new reset token repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert an issued token.
    pub async fn insert_one(&self, token: &PasswordResetToken) -> AppResult<()> {
        self.db
            .collections()
            .reset_tokens
            .insert_one(token.id, token.clone())
    }

    /// Find a token by its code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<PasswordResetToken>> {
        Ok(self
            .db
            .collections()
            .reset_tokens
            .find_one(|t| t.code == code))
    }

    /// Atomically remove the token holding `code`. Of two concurrent
    /// callers only one receives the token.
    pub async fn take_by_code(&self, code: &str) -> AppResult<Option<PasswordResetToken>> {
        let tokens = &self.db.collections().reset_tokens;
        Ok(tokens
            .keys_where(|t| t.code == code)
            .into_iter()
            .find_map(|key| tokens.remove_if(&key, |t| t.code == code)))
    }

    /// Delete every token issued to `user_id`, returning how many.
    pub async fn delete_for_user(&self, user_id: UserId) -> AppResult<usize> {
        Ok(self
            .db
            .collections()
            .reset_tokens
            .delete_many(|t| t.user_id == user_id)
            .len())
    }
}
