//! Append-only version chains.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use docvault_auth::acl;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::Notifier;
use docvault_core::types::id::{DocumentId, VersionId};
use docvault_database::repositories::{DocumentFilter, DocumentRepository, DocumentUpdate};
use docvault_entity::document::{Activity, ActivityAction, Document, DocumentVersion};
use docvault_entity::permission::AccessLevel;
use docvault_storage::{BlobStore, content_type_for};

use super::{DownloadedContent, find_active, update_active};
use crate::context::RequestContext;
use crate::notification::{NotificationRules, deliver};
use crate::user::UserService;

/// Attempts at appending a version before giving up on a document that
/// keeps changing underneath.
const MAX_APPEND_ATTEMPTS: usize = 8;

/// A version annotated with its creator's display name.
#[derive(Debug, Clone, Serialize)]
pub struct VersionEntry {
    /// The version.
    #[serde(flatten)]
    pub version: DocumentVersion,
    /// Display name of the creator.
    pub created_by_name: String,
    /// Whether this version is the active content.
    pub is_current: bool,
}

/// Adds, restores, lists and reads document versions.
#[derive(Clone)]
pub struct VersionService {
    doc_repo: Arc<DocumentRepository>,
    users: Arc<UserService>,
    blobs: Arc<BlobStore>,
    notifier: Arc<dyn Notifier>,
    rules: NotificationRules,
}

impl std::fmt::Debug for VersionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionService").finish_non_exhaustive()
    }
}

impl VersionService {
    /// Creates a new version service.
    pub fn new(
        doc_repo: Arc<DocumentRepository>,
        users: Arc<UserService>,
        blobs: Arc<BlobStore>,
        notifier: Arc<dyn Notifier>,
        rules: NotificationRules,
    ) -> Self {
        Self {
            doc_repo,
            users,
            blobs,
            notifier,
            rules,
        }
    }

    /// Stores `data` as the next version and makes it the active content.
    ///
    /// The number is one past the highest existing number. A concurrent
    /// append is detected and the number recomputed.
    pub async fn add_version(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        data: Bytes,
        filename: &str,
    ) -> AppResult<DocumentVersion> {
        let mut doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::Edit)?;

        let blob = self.blobs.put(data, filename).await?;
        let mut attempts = 0;
        let (updated, version) = loop {
            attempts += 1;
            let number = doc.next_version_number();
            let version =
                DocumentVersion::new(number, blob.storage_ref.clone(), blob.size, ctx.user_id);
            let update = DocumentUpdate::new()
                .push_version(version.clone())
                .mirror_version(version.id)
                .push_activity(Activity::new(
                    ctx.user_id,
                    ActivityAction::Version,
                    json!({ "version_number": number }),
                ));
            let filter = DocumentFilter::by_id(id)
                .trashed(false)
                .at_next_version(number);
            if let Some(updated) = self.doc_repo.update_one(&filter, update).await? {
                break (updated, version);
            }

            let current = match find_active(&self.doc_repo, id).await {
                Ok(current) if attempts < MAX_APPEND_ATTEMPTS => current,
                Ok(_) => {
                    self.discard(&blob.storage_ref).await;
                    return Err(AppError::conflict(
                        "Document changed too often while adding a version",
                    ));
                }
                Err(e) => {
                    self.discard(&blob.storage_ref).await;
                    return Err(e);
                }
            };
            if let Err(e) = acl::require(ctx.user_id, &current, AccessLevel::Edit) {
                self.discard(&blob.storage_ref).await;
                return Err(e);
            }
            doc = current;
        };

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            version = version.version_number,
            size = version.size,
            "New version created"
        );

        let actor_name = self.users.display_name(ctx.user_id).await?;
        deliver(
            self.notifier.as_ref(),
            self.rules
                .versioned(ctx.user_id, &actor_name, &updated, version.version_number),
        )
        .await;
        Ok(version)
    }

    /// Makes an existing version the active content. No version is added.
    pub async fn restore_version(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        version_id: VersionId,
    ) -> AppResult<(Document, DocumentVersion)> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::Edit)?;
        let version = doc
            .version(version_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Version not found"))?;

        let updated = update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .mirror_version(version_id)
                .push_activity(Activity::new(
                    ctx.user_id,
                    ActivityAction::Restore,
                    json!({
                        "version_number": version.version_number,
                        "version_id": version.id,
                    }),
                )),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            version = version.version_number,
            "Version restored"
        );
        Ok((updated, version))
    }

    /// Versions of a document, highest number first.
    pub async fn list_versions(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<Vec<VersionEntry>> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let names = self
            .users
            .display_names(doc.versions.iter().map(|v| v.created_by))
            .await?;
        let mut entries: Vec<VersionEntry> = doc
            .versions
            .iter()
            .map(|v| VersionEntry {
                created_by_name: names
                    .get(&v.created_by)
                    .cloned()
                    .unwrap_or_else(|| crate::user::UNKNOWN_USER.to_string()),
                is_current: v.storage_ref == doc.storage_ref,
                version: v.clone(),
            })
            .collect();
        entries.sort_by_key(|e| std::cmp::Reverse(e.version.version_number));
        Ok(entries)
    }

    /// Reads one version's content with a `{stem}_v{n}{ext}` filename.
    pub async fn read_version(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        version_id: VersionId,
    ) -> AppResult<DownloadedContent> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;
        let version = doc
            .version(version_id)
            .ok_or_else(|| AppError::not_found("Version not found"))?;

        let data = self.blobs.fetch(&version.storage_ref).await?;
        Ok(DownloadedContent {
            size: data.len() as u64,
            data,
            filename: version.download_filename(&doc.original_filename),
            content_type: content_type_for(&doc.original_filename),
        })
    }

    async fn discard(&self, storage_ref: &str) {
        warn!(storage_ref = %storage_ref, "Discarding blob of abandoned version");
        self.blobs
            .remove_all_best_effort(&[storage_ref.to_string()])
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UploadDocument;
    use crate::services::Services;
    use docvault_core::error::ErrorKind;
    use docvault_core::types::id::UserId;

    async fn setup() -> (Services, RequestContext, Document) {
        let services = Services::in_memory();
        let owner = RequestContext::new(UserId::new());
        let doc = services
            .documents
            .upload(
                &owner,
                UploadDocument {
                    filename: "plan.pdf".into(),
                    ..UploadDocument::default()
                },
                Bytes::from_static(b"one"),
            )
            .await
            .unwrap();
        (services, owner, doc)
    }

    #[tokio::test]
    async fn test_numbers_increase() {
        let (services, owner, doc) = setup().await;
        let v2 = services
            .versions
            .add_version(&owner, doc.id, Bytes::from_static(b"two!"), "plan.pdf")
            .await
            .unwrap();
        let v3 = services
            .versions
            .add_version(&owner, doc.id, Bytes::from_static(b"three"), "plan.pdf")
            .await
            .unwrap();
        assert_eq!(v2.version_number, 2);
        assert_eq!(v3.version_number, 3);

        let listed = services
            .versions
            .list_versions(&owner, doc.id)
            .await
            .unwrap();
        let numbers: Vec<_> = listed.iter().map(|e| e.version.version_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert!(listed[0].is_current);
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_share_a_number() {
        let (services, owner, doc) = setup().await;
        let a = services
            .versions
            .add_version(&owner, doc.id, Bytes::from_static(b"a"), "plan.pdf");
        let b = services
            .versions
            .add_version(&owner, doc.id, Bytes::from_static(b"b"), "plan.pdf");
        let (a, b) = tokio::join!(a, b);
        let mut numbers = vec![a.unwrap().version_number, b.unwrap().version_number];
        numbers.sort();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_restore_mirrors_without_new_version() {
        let (services, owner, doc) = setup().await;
        let v1 = doc.versions[0].clone();
        services
            .versions
            .add_version(&owner, doc.id, Bytes::from_static(b"second"), "plan.pdf")
            .await
            .unwrap();

        let (restored, version) = services
            .versions
            .restore_version(&owner, doc.id, v1.id)
            .await
            .unwrap();
        assert_eq!(version.version_number, 1);
        assert_eq!(restored.storage_ref, v1.storage_ref);
        assert_eq!(restored.size, v1.size);
        assert_eq!(restored.versions.len(), 2);
        let last = restored.activities.last().unwrap();
        assert_eq!(last.action, ActivityAction::Restore);
        assert_eq!(last.details["version_number"], 1);

        let err = services
            .versions
            .restore_version(&owner, doc.id, VersionId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_version_filename() {
        let (services, owner, doc) = setup().await;
        let content = services
            .versions
            .read_version(&owner, doc.id, doc.versions[0].id)
            .await
            .unwrap();
        assert_eq!(content.filename, "plan_v1.pdf");
        assert_eq!(&content.data[..], b"one");
        assert_eq!(content.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_viewer_cannot_add_version() {
        let (services, _owner, doc) = setup().await;
        let stranger = RequestContext::new(UserId::new());
        let err = services
            .versions
            .add_version(&stranger, doc.id, Bytes::from_static(b"x"), "plan.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
