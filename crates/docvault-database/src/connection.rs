//! In-memory record store with an optional JSON snapshot on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docvault_core::config::DatabaseConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::types::id::{DocumentId, FolderId, NotificationId, ResetTokenId, UserId};
use docvault_entity::document::Document;
use docvault_entity::folder::Folder;
use docvault_entity::notification::Notification;
use docvault_entity::token::PasswordResetToken;
use docvault_entity::user::User;

use crate::collection::Collection;

/// Every collection of the store.
#[derive(Debug)]
pub(crate) struct Collections {
    pub(crate) users: Collection<UserId, User>,
    pub(crate) documents: Collection<DocumentId, Document>,
    pub(crate) folders: Collection<FolderId, Folder>,
    pub(crate) notifications: Collection<NotificationId, Notification>,
    pub(crate) reset_tokens: Collection<ResetTokenId, PasswordResetToken>,
}

impl Collections {
    fn new() -> Self {
        Self {
            users: Collection::new("users"),
            documents: Collection::new("documents"),
            folders: Collection::new("folders"),
            notifications: Collection::new("notifications"),
            reset_tokens: Collection::new("reset_tokens"),
        }
    }
}

/// On-disk image of the whole store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    folders: Vec<Folder>,
    #[serde(default)]
    notifications: Vec<Notification>,
    #[serde(default)]
    reset_tokens: Vec<PasswordResetToken>,
}

/// Shared handle to the record store. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
    collections: Arc<Collections>,
    snapshot_path: Option<PathBuf>,
}

impl Database {
    /// Create an empty store that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            collections: Arc::new(Collections::new()),
            snapshot_path: None,
        }
    }

    /// Open the store described by `config`, loading its snapshot if one
    /// exists.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let Some(path) = config.snapshot_path.as_deref() else {
            info!("Using ephemeral in-memory store");
            return Ok(Self::in_memory());
        };
        let db = Self {
            collections: Arc::new(Collections::new()),
            snapshot_path: Some(PathBuf::from(path)),
        };
        db.load(Path::new(path)).await?;
        Ok(db)
    }

    async fn load(&self, path: &Path) -> Result<(), AppError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(());
        }
        let raw = tokio::fs::read(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to read snapshot {}", path.display()),
                e,
            )
        })?;
        let snapshot: Snapshot = serde_json::from_slice(&raw).map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Corrupt snapshot {}", path.display()),
                e,
            )
        })?;

        let c = &self.collections;
        c.users.load(snapshot.users, |u| u.id);
        c.documents.load(snapshot.documents, |d| d.id);
        c.folders.load(snapshot.folders, |f| f.id);
        c.notifications.load(snapshot.notifications, |n| n.id);
        c.reset_tokens.load(snapshot.reset_tokens, |t| t.id);

        info!(
            path = %path.display(),
            users = c.users.len(),
            documents = c.documents.len(),
            folders = c.folders.len(),
            "Loaded snapshot"
        );
        Ok(())
    }

    /// Write the snapshot, if the store has a snapshot path.
    ///
    /// The file is replaced atomically through a temporary sibling.
    pub async fn flush(&self) -> Result<(), AppError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        let c = &self.collections;
        let snapshot = Snapshot {
            users: c.users.snapshot(),
            documents: c.documents.snapshot(),
            folders: c.folders.snapshot(),
            notifications: c.notifications.snapshot(),
            reset_tokens: c.reset_tokens.snapshot(),
        };
        let raw = serde_json::to_vec(&snapshot)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &raw).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), bytes = raw.len(), "Snapshot written");
        Ok(())
    }

    /// Check that the store is usable.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }

    pub(crate) fn collections(&self) -> &Collections {
        &self.collections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_entity::user::CreateUser;

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            snapshot_path: Some(dir.path().join("state/db.json").display().to_string()),
        };

        let db = Database::open(&config).await.unwrap();
        let user = User::create(CreateUser {
            email: "olive@example.com".into(),
            first_name: "Olive".into(),
            last_name: "Owner".into(),
        });
        db.collections()
            .users
            .insert_one(user.id, user.clone())
            .unwrap();
        db.flush().await.unwrap();

        let reopened = Database::open(&config).await.unwrap();
        let loaded = reopened.collections().users.get(&user.id).unwrap();
        assert_eq!(loaded.email, "olive@example.com");
    }

    #[tokio::test]
    async fn test_in_memory_flush_is_noop() {
        let db = Database::in_memory();
        db.flush().await.unwrap();
        assert!(db.health_check().await.unwrap());
    }
}
