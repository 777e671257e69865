//! Document repository implementation.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::SortDirection;
use docvault_core::types::id::{CommentId, DocumentId, FolderId, UserId, VersionId};
use docvault_entity::document::{Activity, Comment, Document, DocumentVersion};
use docvault_entity::permission::{AccessControlled, PermissionEntry};

use super::permission::{pull_entry, upsert_entry};
use crate::connection::Database;

/// Criteria selecting documents. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Exact id.
    pub id: Option<DocumentId>,
    /// Owned by this user.
    pub owner_id: Option<UserId>,
    /// Owned by, or granted to, this user.
    pub accessible_to: Option<UserId>,
    /// Granted to this user (ownership alone does not match).
    pub shared_with: Option<UserId>,
    /// Trash state.
    pub is_trashed: Option<bool>,
    /// Containing folder; `Some(None)` selects root documents.
    pub folder_id: Option<Option<FolderId>>,
    /// Number the next appended version would carry. Guards version
    /// appends against a concurrent append.
    pub next_version: Option<u32>,
}

impl DocumentFilter {
    /// Select one document by id.
    pub fn by_id(id: DocumentId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Restrict to documents owned by `user_id`.
    pub fn owned_by(mut self, user_id: UserId) -> Self {
        self.owner_id = Some(user_id);
        self
    }

    /// Restrict to documents owned by or granted to `user_id`.
    pub fn accessible_to(mut self, user_id: UserId) -> Self {
        self.accessible_to = Some(user_id);
        self
    }

    /// Restrict to documents granted to `user_id`.
    pub fn shared_with(mut self, user_id: UserId) -> Self {
        self.shared_with = Some(user_id);
        self
    }

    /// Restrict by trash state.
    pub fn trashed(mut self, is_trashed: bool) -> Self {
        self.is_trashed = Some(is_trashed);
        self
    }

    /// Restrict to one folder (None for root).
    pub fn in_folder(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Restrict to documents whose next version number is still `number`.
    pub fn at_next_version(mut self, number: u32) -> Self {
        self.next_version = Some(number);
        self
    }

    /// Whether `doc` satisfies every set criterion.
    pub fn matches(&self, doc: &Document) -> bool {
        self.id.is_none_or(|id| doc.id == id)
            && self.owner_id.is_none_or(|u| doc.owner_id == u)
            && self
                .accessible_to
                .is_none_or(|u| doc.owner_id == u || doc.permission_for(u).is_some())
            && self
                .shared_with
                .is_none_or(|u| doc.permission_for(u).is_some())
            && self.is_trashed.is_none_or(|t| doc.is_trashed == t)
            && self.folder_id.is_none_or(|f| doc.folder_id == f)
            && self
                .next_version
                .is_none_or(|n| doc.next_version_number() == n)
    }
}

/// Sortable document fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSortField {
    /// Upload time.
    UploadedAt,
    /// Last content or metadata change.
    #[default]
    UpdatedAt,
    /// Last view; never-opened documents sort lowest.
    LastOpened,
    /// Trash time.
    TrashedAt,
    /// Active version size.
    Size,
    /// Title, case-insensitive.
    Title,
}

/// Sort order for document listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DocumentSort {
    /// Field to sort by.
    #[serde(default)]
    pub field: DocumentSortField,
    /// Direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl DocumentSort {
    /// Ascending sort on `field`.
    pub fn asc(field: DocumentSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: DocumentSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Compare two documents under this sort.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = match self.field {
            DocumentSortField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
            DocumentSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            DocumentSortField::LastOpened => a.last_opened.cmp(&b.last_opened),
            DocumentSortField::TrashedAt => a.trashed_at.cmp(&b.trashed_at),
            DocumentSortField::Size => a.size.cmp(&b.size),
            DocumentSortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        self.direction.apply(ord.then_with(|| a.id.cmp(&b.id)))
    }
}

/// A single-record patch: field sets plus embedded list operations, applied
/// atomically by [`DocumentRepository::update_one`].
///
/// Operations apply in this order: field sets, permission changes, version
/// push, version mirror, comment changes, activity appends.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    folder_id: Option<Option<FolderId>>,
    is_favorite: Option<bool>,
    trashed_at: Option<Option<DateTime<Utc>>>,
    last_opened: Option<DateTime<Utc>>,
    touch: bool,
    upsert_permission: Option<PermissionEntry>,
    pull_permission: Option<UserId>,
    push_version: Option<DocumentVersion>,
    mirror_version: Option<VersionId>,
    push_comment: Option<Comment>,
    edit_comment: Option<(CommentId, String)>,
    pull_comment: Option<CommentId>,
    push_activities: Vec<Activity>,
}

impl DocumentUpdate {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self.touch = true;
        self
    }

    /// Set the description.
    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self.touch = true;
        self
    }

    /// Replace the tags.
    pub fn set_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self.touch = true;
        self
    }

    /// Move to a folder (None for root).
    pub fn set_folder(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = Some(folder_id);
        self.touch = true;
        self
    }

    /// Set the favorite flag.
    pub fn set_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    /// Mark trashed at `at`.
    pub fn trash(mut self, at: DateTime<Utc>) -> Self {
        self.trashed_at = Some(Some(at));
        self
    }

    /// Clear the trash flag and time.
    pub fn untrash(mut self) -> Self {
        self.trashed_at = Some(None);
        self
    }

    /// Stamp the last view time.
    pub fn opened_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_opened = Some(at);
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

    /// Append a version.
    pub fn push_version(mut self, version: DocumentVersion) -> Self {
        self.push_version = Some(version);
        self
    }

    /// Make an existing version the active content.
    pub fn mirror_version(mut self, version_id: VersionId) -> Self {
        self.mirror_version = Some(version_id);
        self
    }

    /// Append a comment.
    pub fn push_comment(mut self, comment: Comment) -> Self {
        self.push_comment = Some(comment);
        self
    }

    /// Replace a comment's text.
    pub fn edit_comment(mut self, comment_id: CommentId, text: impl Into<String>) -> Self {
        self.edit_comment = Some((comment_id, text.into()));
        self
    }

    /// Remove a comment.
    pub fn pull_comment(mut self, comment_id: CommentId) -> Self {
        self.pull_comment = Some(comment_id);
        self
    }

    /// Append an activity entry.
    pub fn push_activity(mut self, activity: Activity) -> Self {
        self.push_activities.push(activity);
        self
    }

    /// Apply the patch to `doc`.
    pub fn apply(self, doc: &mut Document) -> AppResult<()> {
        let now = Utc::now();

        if let Some(title) = self.title {
            doc.title = title;
        }
        if let Some(description) = self.description {
            doc.description = description;
        }
        if let Some(tags) = self.tags {
            doc.tags = tags;
        }
        if let Some(folder_id) = self.folder_id {
            doc.folder_id = folder_id;
        }
        if let Some(is_favorite) = self.is_favorite {
            doc.is_favorite = is_favorite;
        }
        if let Some(trashed_at) = self.trashed_at {
            doc.is_trashed = trashed_at.is_some();
            doc.trashed_at = trashed_at;
        }
        if let Some(at) = self.last_opened {
            doc.last_opened = Some(at);
        }
        if self.touch {
            doc.updated_at = now;
        }

        if let Some(entry) = self.upsert_permission {
            upsert_entry(&mut doc.permissions, entry);
        }
        if let Some(user_id) = self.pull_permission {
            pull_entry(&mut doc.permissions, user_id)?;
        }

        if let Some(version) = self.push_version {
            doc.versions.push(version);
        }
        if let Some(version_id) = self.mirror_version {
            let version = doc
                .version(version_id)
                .cloned()
                .ok_or_else(|| AppError::not_found("Version not found"))?;
            doc.mirror_version(&version);
        }

        if let Some(comment) = self.push_comment {
            doc.comments.push(comment);
        }
        if let Some((comment_id, text)) = self.edit_comment {
            let comment = doc
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or_else(|| AppError::not_found("Comment not found"))?;
            comment.text = text;
            comment.updated_at = now;
        }
        if let Some(comment_id) = self.pull_comment {
            let before = doc.comments.len();
            doc.comments.retain(|c| c.id != comment_id);
            if doc.comments.len() == before {
                return Err(AppError::not_found("Comment not found"));
            }
        }

        doc.activities.extend(self.push_activities);
        Ok(())
    }
}

/// Repository for document records.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: Database,
}

impl DocumentRepository {
    /// Create a new document repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find one document matching `filter`.
    pub async fn find_one(&self, filter: &DocumentFilter) -> AppResult<Option<Document>> {
        let docs = &self.db.collections().documents;
        Ok(match filter.id {
            Some(id) => docs.get(&id).filter(|d| filter.matches(d)),
            None => docs.find_one(|d| filter.matches(d)),
        })
    }

    /// Find every document matching `filter`, sorted.
    pub async fn find(
        &self,
        filter: &DocumentFilter,
        sort: DocumentSort,
    ) -> AppResult<Vec<Document>> {
        let mut docs = self
            .db
            .collections()
            .documents
            .find(|d| filter.matches(d));
        docs.sort_by(|a, b| sort.compare(a, b));
        Ok(docs)
    }

    /// Insert a new document.
    pub async fn insert_one(&self, doc: &Document) -> AppResult<()> {
        self.db
            .collections()
            .documents
            .insert_one(doc.id, doc.clone())
    }

    /// Atomically apply `update` to the first document matching `filter`.
    ///
    /// Returns the updated document, or `None` when nothing matches.
    pub async fn update_one(
        &self,
        filter: &DocumentFilter,
        update: DocumentUpdate,
    ) -> AppResult<Option<Document>> {
        let docs = &self.db.collections().documents;
        let key = match filter.id {
            Some(id) => Some(id),
            None => docs.keys_where(|d| filter.matches(d)).into_iter().next(),
        };
        let Some(key) = key else {
            return Ok(None);
        };
        Ok(docs
            .update_one(&key, |d| filter.matches(d), |d| update.apply(d))?
            .map(|(doc, ())| doc))
    }

    /// Delete every document matching `filter`, returning the removed
    /// records.
    pub async fn delete_many(&self, filter: &DocumentFilter) -> AppResult<Vec<Document>> {
        Ok(self
            .db
            .collections()
            .documents
            .delete_many(|d| filter.matches(d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_entity::document::{ActivityAction, CreateDocument};
    use docvault_entity::permission::AccessLevel;

    fn new_doc(owner: UserId, title: &str) -> Document {
        Document::create(
            CreateDocument {
                title: title.into(),
                description: String::new(),
                author: "Owner".into(),
                tags: vec![],
                original_filename: format!("{title}.pdf"),
                owner_id: owner,
                folder_id: None,
            },
            DocumentVersion::new(1, format!("{title}-v1.pdf"), 10, owner),
        )
    }

    #[tokio::test]
    async fn test_update_one_applies_all_parts() {
        let repo = DocumentRepository::new(Database::in_memory());
        let owner = UserId::new();
        let grantee = UserId::new();
        let doc = new_doc(owner, "plan");
        repo.insert_one(&doc).await.unwrap();

        let v2 = DocumentVersion::new(2, "plan-v2.pdf", 20, grantee);
        let v2_id = v2.id;
        let updated = repo
            .update_one(
                &DocumentFilter::by_id(doc.id),
                DocumentUpdate::new()
                    .upsert_permission(PermissionEntry {
                        user_id: grantee,
                        access_level: AccessLevel::Edit,
                        granted_at: Utc::now(),
                        granted_by: owner,
                    })
                    .push_version(v2)
                    .mirror_version(v2_id)
                    .push_activity(Activity::new(
                        grantee,
                        ActivityAction::Version,
                        serde_json::json!({"version_number": 2}),
                    )),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.storage_ref, "plan-v2.pdf");
        assert_eq!(updated.size, 20);
        assert_eq!(updated.versions.len(), 2);
        assert_eq!(updated.permissions.len(), 1);
        assert_eq!(updated.activities.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_changes_nothing() {
        let repo = DocumentRepository::new(Database::in_memory());
        let owner = UserId::new();
        let doc = new_doc(owner, "memo");
        repo.insert_one(&doc).await.unwrap();

        let result = repo
            .update_one(
                &DocumentFilter::by_id(doc.id),
                DocumentUpdate::new()
                    .push_activity(Activity::new(
                        owner,
                        ActivityAction::Unshare,
                        serde_json::Value::Null,
                    ))
                    .pull_permission(UserId::new()),
            )
            .await;
        assert!(result.is_err());

        let stored = repo
            .find_one(&DocumentFilter::by_id(doc.id))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.activities.is_empty());
    }

    #[tokio::test]
    async fn test_filter_and_sort() {
        let repo = DocumentRepository::new(Database::in_memory());
        let owner = UserId::new();
        let mut big = new_doc(owner, "big");
        big.size = 500;
        let small = new_doc(owner, "small");
        let mut trashed = new_doc(owner, "gone");
        trashed.is_trashed = true;
        for d in [&big, &small, &trashed] {
            repo.insert_one(d).await.unwrap();
        }

        let found = repo
            .find(
                &DocumentFilter::default().owned_by(owner).trashed(false),
                DocumentSort::desc(DocumentSortField::Size),
            )
            .await
            .unwrap();
        let titles: Vec<_> = found.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["big", "small"]);

        let conditional = repo
            .update_one(
                &DocumentFilter::by_id(small.id).trashed(true),
                DocumentUpdate::new().untrash(),
            )
            .await
            .unwrap();
        assert!(conditional.is_none());
    }

    #[tokio::test]
    async fn test_version_guard_rejects_stale_number() {
        let repo = DocumentRepository::new(Database::in_memory());
        let owner = UserId::new();
        let doc = new_doc(owner, "roadmap");
        repo.insert_one(&doc).await.unwrap();

        let append = |n: u32| {
            DocumentUpdate::new().push_version(DocumentVersion::new(
                n,
                format!("roadmap-v{n}.pdf"),
                1,
                owner,
            ))
        };
        let first = repo
            .update_one(&DocumentFilter::by_id(doc.id).at_next_version(2), append(2))
            .await
            .unwrap();
        assert!(first.is_some());

        let stale = repo
            .update_one(&DocumentFilter::by_id(doc.id).at_next_version(2), append(2))
            .await
            .unwrap();
        assert!(stale.is_none());
    }
}
