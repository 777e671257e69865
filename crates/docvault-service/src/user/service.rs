//! User registration and display-name resolution.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_database::repositories::UserRepository;
use docvault_entity::user::{CreateUser, User};

/// Display name used for activity, comments and versions whose author no
/// longer exists.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Public identity of a user as shown next to grants and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User ID.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name(),
        }
    }
}

/// Manages user display identities.
#[derive(Debug, Clone)]
pub struct UserService {
    user_repo: Arc<UserRepository>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Registers a user. The email is trimmed and must be unused.
    pub async fn register(&self, data: CreateUser) -> AppResult<User> {
        let email = data.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("A valid email address is required"));
        }
        let user = User::create(CreateUser {
            email,
            first_name: data.first_name.trim().to_string(),
            last_name: data.last_name.trim().to_string(),
        });
        self.user_repo.insert_one(&user).await?;

        info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get(&self, user_id: UserId) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Gets a user by email.
    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Lists every user, oldest first.
    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.user_repo.find_all().await
    }

    /// Display name of `user_id`, or [`UNKNOWN_USER`].
    pub async fn display_name(&self, user_id: UserId) -> AppResult<String> {
        Ok(self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|u| u.display_name())
            .unwrap_or_else(|| UNKNOWN_USER.to_string()))
    }

    /// Resolves a batch of user IDs. Unknown users are absent from the map.
    pub async fn resolve(
        &self,
        user_ids: impl IntoIterator<Item = UserId>,
    ) -> AppResult<HashMap<UserId, User>> {
        let mut resolved = HashMap::new();
        for id in user_ids {
            if resolved.contains_key(&id) {
                continue;
            }
            if let Some(user) = self.user_repo.find_by_id(id).await? {
                resolved.insert(id, user);
            }
        }
        Ok(resolved)
    }

    /// Display names for a batch of IDs, unknown users mapped to
    /// [`UNKNOWN_USER`].
    pub async fn display_names(
        &self,
        user_ids: impl IntoIterator<Item = UserId>,
    ) -> AppResult<HashMap<UserId, String>> {
        let ids: Vec<UserId> = user_ids.into_iter().collect();
        let users = self.resolve(ids.iter().copied()).await?;
        Ok(ids
            .into_iter()
            .map(|id| {
                let name = users
                    .get(&id)
                    .map(|u| u.display_name())
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                (id, name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::error::ErrorKind;
    use docvault_database::Database;

    fn service() -> UserService {
        UserService::new(Arc::new(UserRepository::new(Database::in_memory())))
    }

    fn alice() -> CreateUser {
        CreateUser {
            email: " alice@example.com ".into(),
            first_name: "Alice".into(),
            last_name: "Martin".into(),
        }
    }

    #[tokio::test]
    async fn test_register_trims_and_rejects_duplicates() {
        let users = service();
        let user = users.register(alice()).await.unwrap();
        assert_eq!(user.email, "alice@example.com");

        let err = users.register(alice()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_register_requires_email() {
        let err = service()
            .register(CreateUser {
                email: "  ".into(),
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_display_names_fall_back_for_unknown() {
        let users = service();
        let user = users.register(alice()).await.unwrap();
        let ghost = UserId::new();

        let names = users.display_names([user.id, ghost]).await.unwrap();
        assert_eq!(names[&user.id], "Alice Martin");
        assert_eq!(names[&ghost], UNKNOWN_USER);
    }
}
