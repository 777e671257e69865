//! Document aggregate model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::{CommentId, DocumentId, FolderId, UserId, VersionId};

use super::activity::Activity;
use super::comment::Comment;
use super::kind::DocumentKind;
use super::version::DocumentVersion;
use crate::permission::{AccessControlled, PermissionEntry};

/// An uploaded document together with its grants, versions, comments and
/// activity log.
///
/// `storage_ref` and `size` cache the active version. They are only ever
/// written by [`Document::mirror_version`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: DocumentId,
    /// Display title.
    pub title: String,
    /// Content category.
    pub kind: DocumentKind,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Display name of the uploader.
    pub author: String,
    /// User-assigned tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Blob reference of the active version.
    pub storage_ref: String,
    /// Size in bytes of the active version.
    pub size: u64,
    /// Filename supplied at upload.
    pub original_filename: String,
    /// The document owner.
    pub owner_id: UserId,
    /// Containing folder (None for root).
    pub folder_id: Option<FolderId>,
    /// When the document was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// When content or metadata last changed.
    pub updated_at: DateTime<Utc>,
    /// When the document was last viewed.
    pub last_opened: Option<DateTime<Utc>>,
    /// Favorite flag set by toggling.
    #[serde(default)]
    pub is_favorite: bool,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_trashed: bool,
    /// When the document was trashed.
    pub trashed_at: Option<DateTime<Utc>>,
    /// Per-user grants.
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
    /// Append-only version chain.
    #[serde(default)]
    pub versions: Vec<DocumentVersion>,
    /// Comments, in creation order.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Append-only activity log.
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// Data required to create a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    /// Display title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Display name of the uploader.
    pub author: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Filename supplied at upload.
    pub original_filename: String,
    /// The uploader, who becomes the owner.
    pub owner_id: UserId,
    /// Target folder.
    pub folder_id: Option<FolderId>,
}

impl Document {
    /// Build a document whose first version is `first_version`.
    pub fn create(data: CreateDocument, first_version: DocumentVersion) -> Self {
        let now = first_version.created_at;
        let mut doc = Self {
            id: DocumentId::new(),
            title: data.title,
            kind: DocumentKind::from_filename(&data.original_filename),
            description: data.description,
            author: data.author,
            tags: data.tags,
            storage_ref: String::new(),
            size: 0,
            original_filename: data.original_filename,
            owner_id: data.owner_id,
            folder_id: data.folder_id,
            uploaded_at: now,
            updated_at: now,
            last_opened: None,
            is_favorite: false,
            is_trashed: false,
            trashed_at: None,
            permissions: Vec::new(),
            versions: Vec::new(),
            comments: Vec::new(),
            activities: Vec::new(),
        };
        doc.mirror_version(&first_version);
        doc.versions.push(first_version);
        doc
    }

    /// Make `version` the active content.
    pub fn mirror_version(&mut self, version: &DocumentVersion) {
        self.storage_ref = version.storage_ref.clone();
        self.size = version.size;
        self.updated_at = Utc::now().max(version.created_at);
    }

    /// Number the next appended version will carry.
    pub fn next_version_number(&self) -> u32 {
        self.versions
            .iter()
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Look up a version by id.
    pub fn version(&self, version_id: VersionId) -> Option<&DocumentVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    /// Look up a comment by id.
    pub fn comment(&self, comment_id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Latest favorite or unfavorite entry recorded by `user_id`.
    ///
    /// Ties on timestamp go to the entry appended last.
    pub fn latest_favorite_event(&self, user_id: UserId) -> Option<&Activity> {
        self.activities
            .iter()
            .filter(|a| a.user_id == user_id && a.action.is_favorite_toggle())
            .fold(None, |latest: Option<&Activity>, a| match latest {
                Some(l) if l.timestamp > a.timestamp => Some(l),
                _ => Some(a),
            })
    }

    /// Every distinct blob referenced by this document.
    pub fn blob_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = Vec::with_capacity(self.versions.len() + 1);
        let all = std::iter::once(&self.storage_ref)
            .chain(self.versions.iter().map(|v| &v.storage_ref));
        for r in all {
            if !r.is_empty() && !refs.contains(r) {
                refs.push(r.clone());
            }
        }
        refs
    }
}

impl AccessControlled for Document {
    const LABEL: &'static str = "Document";

    fn owner_id(&self) -> UserId {
        self.owner_id
    }

    fn permissions(&self) -> &[PermissionEntry] {
        &self.permissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ActivityAction;
    use chrono::Duration;

    fn sample(owner: UserId) -> Document {
        Document::create(
            CreateDocument {
                title: "Report".into(),
                description: String::new(),
                author: "Olive Owner".into(),
                tags: vec![],
                original_filename: "report.pdf".into(),
                owner_id: owner,
                folder_id: None,
            },
            DocumentVersion::new(1, "v1.pdf", 100, owner),
        )
    }

    #[test]
    fn test_create_mirrors_first_version() {
        let doc = sample(UserId::new());
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert_eq!(doc.storage_ref, "v1.pdf");
        assert_eq!(doc.size, 100);
        assert_eq!(doc.versions.len(), 1);
        assert_eq!(doc.next_version_number(), 2);
    }

    #[test]
    fn test_blob_refs_deduplicated() {
        let owner = UserId::new();
        let mut doc = sample(owner);
        let v2 = DocumentVersion::new(2, "v2.pdf", 200, owner);
        doc.versions.push(v2);
        assert_eq!(doc.blob_refs(), ["v1.pdf", "v2.pdf"]);
    }

    #[test]
    fn test_latest_favorite_event_tie_goes_to_last_appended() {
        let owner = UserId::new();
        let mut doc = sample(owner);
        let ts = Utc::now();
        let mut fav = Activity::new(owner, ActivityAction::Favorite, serde_json::Value::Null);
        fav.timestamp = ts;
        let mut unfav = Activity::new(owner, ActivityAction::Unfavorite, serde_json::Value::Null);
        unfav.timestamp = ts;
        let mut older = Activity::new(owner, ActivityAction::Favorite, serde_json::Value::Null);
        older.timestamp = ts - Duration::seconds(5);
        doc.activities.extend([fav, unfav, older]);

        let latest = doc.latest_favorite_event(owner).unwrap();
        assert_eq!(latest.action, ActivityAction::Unfavorite);
        assert!(doc.latest_favorite_event(UserId::new()).is_none());
    }
}
