//! Folder repository implementation.

use chrono::{DateTime, Utc};

use docvault_core::result::AppResult;
use docvault_core::types::id::{FolderId, UserId};
use docvault_entity::folder::Folder;
use docvault_entity::permission::{AccessControlled, PermissionEntry};

use super::permission::{pull_entry, upsert_entry};
use crate::connection::Database;

/// Criteria selecting folders. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct FolderFilter {
    /// Exact id.
    pub id: Option<FolderId>,
    /// Owned by this user.
    pub owner_id: Option<UserId>,
    /// Owned by, or granted to, this user.
    pub accessible_to: Option<UserId>,
    /// Parent folder; `Some(None)` selects root folders.
    pub parent_id: Option<Option<FolderId>>,
    /// Exact name.
    pub name: Option<String>,
    /// Trash state.
    pub is_trashed: Option<bool>,
}

impl FolderFilter {
    /// Select one folder by id.
    pub fn by_id(id: FolderId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Restrict to folders owned by `user_id`.
    pub fn owned_by(mut self, user_id: UserId) -> Self {
        self.owner_id = Some(user_id);
        self
    }

    /// Restrict to folders owned by or granted to `user_id`.
    pub fn accessible_to(mut self, user_id: UserId) -> Self {
        self.accessible_to = Some(user_id);
        self
    }

    /// Restrict to children of `parent_id` (None for root).
    pub fn under(mut self, parent_id: Option<FolderId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Restrict to an exact name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict by trash state.
    pub fn trashed(mut self, is_trashed: bool) -> Self {
        self.is_trashed = Some(is_trashed);
        self
    }

    /// Whether `folder` satisfies every set criterion.
    pub fn matches(&self, folder: &Folder) -> bool {
        self.id.is_none_or(|id| folder.id == id)
            && self.owner_id.is_none_or(|u| folder.owner_id == u)
            && self
                .accessible_to
                .is_none_or(|u| {
                    folder.owner_id == u || folder.permission_for(u).is_some()
                })
            && self.parent_id.is_none_or(|p| folder.parent_id == p)
            && self.name.as_deref().is_none_or(|n| folder.name == n)
            && self.is_trashed.is_none_or(|t| folder.is_trashed == t)
    }
}

/// A single-record folder patch applied atomically by
/// [`FolderRepository::update_one`].
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    name: Option<String>,
    parent_id: Option<Option<FolderId>>,
    trashed_at: Option<Option<DateTime<Utc>>>,
    upsert_permission: Option<PermissionEntry>,
    pull_permission: Option<UserId>,
}

impl FolderUpdate {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename.
    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Re-parent (None for root).
    pub fn set_parent(mut self, parent_id: Option<FolderId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Mark trashed at `at`.
    pub fn trash(mut self, at: DateTime<Utc>) -> Self {
        self.trashed_at = Some(Some(at));
        self
    }

    /// Grant or replace a permission entry.
    pub fn upsert_permission(mut self, entry: PermissionEntry) -> Self {
        self.upsert_permission = Some(entry);
        self
    }

    /// Remove the grantee's entry; the update fails if there is none.
    pub fn pull_permission(mut self, user_id: UserId) -> Self {
        self.pull_permission = Some(user_id);
        self
    }

    /// Apply the patch to `folder`.
    pub fn apply(self, folder: &mut Folder) -> AppResult<()> {
        let mut touched = false;
        if let Some(name) = self.name {
            folder.name = name;
            touched = true;
        }
        if let Some(parent_id) = self.parent_id {
            folder.parent_id = parent_id;
            touched = true;
        }
        if let Some(trashed_at) = self.trashed_at {
            folder.is_trashed = trashed_at.is_some();
            folder.trashed_at = trashed_at;
        }
        if let Some(entry) = self.upsert_permission {
            upsert_entry(&mut folder.permissions, entry);
        }
        if let Some(user_id) = self.pull_permission {
            pull_entry(&mut folder.permissions, user_id)?;
        }
        if touched {
            folder.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Repository for folder records and tree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    db: Database,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find one folder matching `filter`.
    pub async fn find_one(&self, filter: &FolderFilter) -> AppResult<Option<Folder>> {
        let folders = &self.db.collections().folders;
        Ok(match filter.id {
            Some(id) => folders.get(&id).filter(|f| filter.matches(f)),
            None => folders.find_one(|f| filter.matches(f)),
        })
    }

    /// Find every folder matching `filter`, ordered by name.
    pub async fn find(&self, filter: &FolderFilter) -> AppResult<Vec<Folder>> {
        let mut folders = self
            .db
            .collections()
            .folders
            .find(|f| filter.matches(f));
        folders.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(folders)
    }

    /// Insert a new folder.
    pub async fn insert_one(&self, folder: &Folder) -> AppResult<()> {
        self.db
            .collections()
            .folders
            .insert_one(folder.id, folder.clone())
    }

    /// Atomically apply `update` to the first folder matching `filter`.
    pub async fn update_one(
        &self,
        filter: &FolderFilter,
        update: FolderUpdate,
    ) -> AppResult<Option<Folder>> {
        let folders = &self.db.collections().folders;
        let key = match filter.id {
            Some(id) => Some(id),
            None => folders.keys_where(|f| filter.matches(f)).into_iter().next(),
        };
        let Some(key) = key else {
            return Ok(None);
        };
        Ok(folders
            .update_one(&key, |f| filter.matches(f), |f| update.apply(f))?
            .map(|(folder, ())| folder))
    }

    /// Ancestor chain of `folder_id`, nearest parent first.
    ///
    /// Stops at a missing parent and at the first repeated id, so a
    /// corrupted cyclic graph still terminates.
    pub async fn ancestors(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        let folders = &self.db.collections().folders;
        let mut chain: Vec<Folder> = Vec::new();
        let mut next = folders.get(&folder_id).and_then(|f| f.parent_id);
        while let Some(id) = next {
            if id == folder_id || chain.iter().any(|f| f.id == id) {
                break;
            }
            let Some(parent) = folders.get(&id) else {
                break;
            };
            next = parent.parent_id;
            chain.push(parent);
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_entity::folder::CreateFolder;

    async fn create(
        repo: &FolderRepository,
        owner: UserId,
        name: &str,
        parent: Option<FolderId>,
    ) -> Folder {
        let folder = Folder::create(CreateFolder {
            name: name.into(),
            owner_id: owner,
            parent_id: parent,
        });
        repo.insert_one(&folder).await.unwrap();
        folder
    }

    #[tokio::test]
    async fn test_children_sorted_by_name() {
        let repo = FolderRepository::new(Database::in_memory());
        let owner = UserId::new();
        let root = create(&repo, owner, "root", None).await;
        create(&repo, owner, "zeta", Some(root.id)).await;
        create(&repo, owner, "alpha", Some(root.id)).await;

        let children = repo
            .find(&FolderFilter::default().under(Some(root.id)).trashed(false))
            .await
            .unwrap();
        let names: Vec<_> = children.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_ancestors() {
        let repo = FolderRepository::new(Database::in_memory());
        let owner = UserId::new();
        let a = create(&repo, owner, "a", None).await;
        let b = create(&repo, owner, "b", Some(a.id)).await;
        let c = create(&repo, owner, "c", Some(b.id)).await;

        let chain = repo.ancestors(c.id).await.unwrap();
        let ids: Vec<_> = chain.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert!(repo.ancestors(a.id).await.unwrap().is_empty());
    }
}
