//! Document upload, viewing, metadata edits, download and listings.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use docvault_auth::acl;
use docvault_core::config::activity::ActivityConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::Notifier;
use docvault_core::types::SortDirection;
use docvault_core::types::id::{DocumentId, FolderId};
use docvault_database::repositories::{
    DocumentFilter, DocumentRepository, DocumentSort, DocumentSortField, DocumentUpdate,
    FolderFilter, FolderRepository,
};
use docvault_entity::document::{
    Activity, ActivityAction, CreateDocument, Document, DocumentKind, DocumentVersion,
};
use docvault_entity::permission::AccessLevel;
use docvault_storage::{BlobStore, content_type_for};

use super::{DownloadedContent, find_active, update_active};
use crate::context::RequestContext;
use crate::notification::{NotificationRules, deliver};
use crate::request;
use crate::user::UserService;

/// Metadata accompanying an uploaded body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UploadDocument {
    /// Name of the uploaded file, extension included.
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    /// Title; defaults to the filename without its extension.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Target folder; the document lands at the root when unset.
    #[serde(default)]
    pub folder_id: Option<FolderId>,
}

/// Metadata changes. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDocument {
    /// New title.
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement tag list.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Move into this folder.
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    /// Move to the root. Ignored when `folder_id` is set.
    #[serde(default)]
    pub move_to_root: bool,
}

/// Filters and ordering for the actor's document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListDocumentsQuery {
    /// Sort field.
    pub sort: DocumentSortField,
    /// Sort direction.
    pub order: SortDirection,
    /// Include documents shared with the actor.
    pub include_shared: bool,
    /// Minimum size in bytes.
    pub min_size: Option<u64>,
    /// Maximum size in bytes.
    pub max_size: Option<u64>,
    /// Only this kind.
    pub kind: Option<DocumentKind>,
    /// Only documents directly inside this folder.
    pub folder_id: Option<FolderId>,
    /// Only documents at the root. Ignored when `folder_id` is set.
    pub root_only: bool,
}

impl Default for ListDocumentsQuery {
    fn default() -> Self {
        Self {
            sort: DocumentSortField::UploadedAt,
            order: SortDirection::Desc,
            include_shared: false,
            min_size: None,
            max_size: None,
            kind: None,
            folder_id: None,
            root_only: false,
        }
    }
}

/// A document granted to the actor, with the actor's level.
#[derive(Debug, Clone, Serialize)]
pub struct SharedDocument {
    /// The document.
    #[serde(flatten)]
    pub document: Document,
    /// The actor's granted level.
    pub access_level: AccessLevel,
}

/// Upload, view, edit, download and list documents.
#[derive(Clone)]
pub struct DocumentService {
    doc_repo: Arc<DocumentRepository>,
    folder_repo: Arc<FolderRepository>,
    users: Arc<UserService>,
    blobs: Arc<BlobStore>,
    notifier: Arc<dyn Notifier>,
    rules: NotificationRules,
    recent_limit: usize,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("recent_limit", &self.recent_limit)
            .finish_non_exhaustive()
    }
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        doc_repo: Arc<DocumentRepository>,
        folder_repo: Arc<FolderRepository>,
        users: Arc<UserService>,
        blobs: Arc<BlobStore>,
        notifier: Arc<dyn Notifier>,
        rules: NotificationRules,
        config: &ActivityConfig,
    ) -> Self {
        Self {
            doc_repo,
            folder_repo,
            users,
            blobs,
            notifier,
            rules,
            recent_limit: config.recent_files_limit,
        }
    }

    /// Stores a fully buffered body as a new document owned by the actor.
    ///
    /// The body becomes version 1 and the document's active content.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        req: UploadDocument,
        data: Bytes,
    ) -> AppResult<Document> {
        request::validate(&req)?;
        let filename = request::required(&req.filename, "Filename")?;
        let title = match req.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => std::path::Path::new(&filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&filename)
                .to_string(),
        };
        if let Some(folder_id) = req.folder_id {
            self.require_folder(ctx, folder_id).await?;
        }

        let blob = self.blobs.put(data, &filename).await?;
        let author = self.users.display_name(ctx.user_id).await?;
        let first = DocumentVersion::new(1, blob.storage_ref.clone(), blob.size, ctx.user_id);

        let mut doc = Document::create(
            CreateDocument {
                title,
                description: req.description.trim().to_string(),
                author,
                tags: clean_tags(req.tags),
                original_filename: filename.clone(),
                owner_id: ctx.user_id,
                folder_id: req.folder_id,
            },
            first,
        );
        doc.activities.push(Activity::new(
            ctx.user_id,
            ActivityAction::Upload,
            json!({ "original_filename": filename }),
        ));

        if let Err(e) = self.doc_repo.insert_one(&doc).await {
            warn!(storage_ref = %blob.storage_ref, "Discarding blob of failed upload");
            self.blobs.remove_all_best_effort(&[blob.storage_ref]).await;
            return Err(e);
        }

        info!(
            user_id = %ctx.user_id,
            document_id = %doc.id,
            size = doc.size,
            kind = %doc.kind,
            "Document uploaded"
        );
        Ok(doc)
    }

    /// Opens a document: stamps `last_opened` and records a view.
    pub async fn get(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<Document> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let now = Utc::now();
        update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .opened_at(now)
                .push_activity(Activity::new(ctx.user_id, ActivityAction::View, json!({}))),
        )
        .await
    }

    /// Applies metadata changes. Nothing is written when no field differs.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        req: UpdateDocument,
    ) -> AppResult<Document> {
        request::validate(&req)?;
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::Edit)?;

        let mut update = DocumentUpdate::new();
        let mut fields: Vec<&str> = Vec::new();

        if let Some(title) = req.title {
            let title = request::required(&title, "Title")?;
            if title != doc.title {
                update = update.set_title(title);
                fields.push("title");
            }
        }
        if let Some(description) = req.description {
            let description = description.trim().to_string();
            if description != doc.description {
                update = update.set_description(description);
                fields.push("description");
            }
        }
        if let Some(tags) = req.tags {
            let tags = clean_tags(tags);
            if tags != doc.tags {
                update = update.set_tags(tags);
                fields.push("tags");
            }
        }
        let target = match (req.folder_id, req.move_to_root) {
            (Some(folder_id), _) => Some(Some(folder_id)),
            (None, true) => Some(None),
            (None, false) => None,
        };
        if let Some(target) = target {
            if target != doc.folder_id {
                if let Some(folder_id) = target {
                    self.require_folder(ctx, folder_id).await?;
                }
                update = update.set_folder(target);
                fields.push("folder");
            }
        }

        if fields.is_empty() {
            return Ok(doc);
        }

        let updated = update_active(
            &self.doc_repo,
            id,
            update.push_activity(Activity::new(
                ctx.user_id,
                ActivityAction::Edit,
                json!({ "fields_updated": fields }),
            )),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            fields = ?fields,
            "Document metadata updated"
        );

        let actor_name = self.users.display_name(ctx.user_id).await?;
        deliver(
            self.notifier.as_ref(),
            self.rules
                .edited(ctx.user_id, &actor_name, &updated, &fields),
        )
        .await;
        Ok(updated)
    }

    /// Reads the active content and records a download.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<DownloadedContent> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let data = self.blobs.fetch(&doc.storage_ref).await?;
        update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .push_activity(Activity::new(ctx.user_id, ActivityAction::Download, json!({}))),
        )
        .await?;

        info!(user_id = %ctx.user_id, document_id = %id, "Document downloaded");
        Ok(DownloadedContent {
            size: data.len() as u64,
            data,
            content_type: content_type_for(&doc.original_filename),
            filename: doc.original_filename,
        })
    }

    /// The actor's non-trashed documents, optionally including those
    /// shared with them.
    pub async fn list_documents(
        &self,
        ctx: &RequestContext,
        query: ListDocumentsQuery,
    ) -> AppResult<Vec<Document>> {
        let mut filter = DocumentFilter::default().trashed(false);
        filter = if query.include_shared {
            filter.accessible_to(ctx.user_id)
        } else {
            filter.owned_by(ctx.user_id)
        };
        if let Some(folder_id) = query.folder_id {
            filter = filter.in_folder(Some(folder_id));
        } else if query.root_only {
            filter = filter.in_folder(None);
        }

        let sort = DocumentSort {
            field: query.sort,
            direction: query.order,
        };
        let docs = self.doc_repo.find(&filter, sort).await?;
        Ok(docs
            .into_iter()
            .filter(|d| query.min_size.is_none_or(|min| d.size >= min))
            .filter(|d| query.max_size.is_none_or(|max| d.size <= max))
            .filter(|d| query.kind.is_none_or(|k| d.kind == k))
            .collect())
    }

    /// Non-trashed documents granted to the actor, most recently updated
    /// first.
    pub async fn list_shared(&self, ctx: &RequestContext) -> AppResult<Vec<SharedDocument>> {
        let docs = self
            .doc_repo
            .find(
                &DocumentFilter::default()
                    .shared_with(ctx.user_id)
                    .trashed(false),
                DocumentSort::desc(DocumentSortField::UpdatedAt),
            )
            .await?;
        Ok(docs
            .into_iter()
            .filter_map(|document| {
                let access_level = acl::evaluate(ctx.user_id, &document)?;
                Some(SharedDocument {
                    document,
                    access_level,
                })
            })
            .collect())
    }

    /// Accessible documents the actor or anyone else has opened, most
    /// recently opened first.
    pub async fn list_recent(&self, ctx: &RequestContext) -> AppResult<Vec<Document>> {
        let mut docs = self
            .doc_repo
            .find(
                &DocumentFilter::default()
                    .accessible_to(ctx.user_id)
                    .trashed(false),
                DocumentSort::desc(DocumentSortField::LastOpened),
            )
            .await?;
        docs.retain(|d| d.last_opened.is_some());
        docs.truncate(self.recent_limit);
        Ok(docs)
    }

    async fn require_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<()> {
        let folder = self
            .folder_repo
            .find_one(&FolderFilter::by_id(folder_id).trashed(false))
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        acl::require(ctx.user_id, &folder, AccessLevel::Edit)?;
        Ok(())
    }
}

/// Trims tags and drops blanks and duplicates, keeping the first
/// occurrence order.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
