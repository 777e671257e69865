//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::{FolderId, UserId};

use crate::permission::{AccessControlled, PermissionEntry};

/// A folder in a user's document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name, unique among the owner's non-trashed siblings.
    pub name: String,
    /// The folder owner.
    pub owner_id: UserId,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<FolderId>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_trashed: bool,
    /// When the folder was trashed.
    pub trashed_at: Option<DateTime<Utc>>,
    /// Per-user grants.
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

impl Folder {
    /// Build a new, empty folder.
    pub fn create(data: CreateFolder) -> Self {
        let now = Utc::now();
        Self {
            id: FolderId::new(),
            name: data.name,
            owner_id: data.owner_id,
            parent_id: data.parent_id,
            created_at: now,
            updated_at: now,
            is_trashed: false,
            trashed_at: None,
            permissions: Vec::new(),
        }
    }

    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl AccessControlled for Folder {
    const LABEL: &'static str = "Folder";

    fn owner_id(&self) -> UserId {
        self.owner_id
    }

    fn permissions(&self) -> &[PermissionEntry] {
        &self.permissions
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Folder name, already trimmed.
    pub name: String,
    /// The folder owner.
    pub owner_id: UserId,
    /// Parent folder (None for root).
    pub parent_id: Option<FolderId>,
}
