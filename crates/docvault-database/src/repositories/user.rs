//! User repository implementation.

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_entity::user::User;

use crate::connection::Database;

/// Repository for user display identities.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.db.collections().users.get(&id))
    }

    /// Find a user by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .db
            .collections()
            .users
            .find_one(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// All users, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        let mut users = self.db.collections().users.snapshot();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    /// Insert a user; the email must be unused.
    pub async fn insert_one(&self, user: &User) -> AppResult<()> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        self.db
            .collections()
            .users
            .insert_one(user.id, user.clone())
    }
}
