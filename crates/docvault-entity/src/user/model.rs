//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::UserId;

/// A registered user's display identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from registration data.
    pub fn create(data: CreateUser) -> Self {
        Self {
            id: UserId::new(),
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            created_at: Utc::now(),
        }
    }

    /// "first last", falling back to the email when both are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// Data required to register a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}
