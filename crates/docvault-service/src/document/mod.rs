//! Document services: upload, metadata, lifecycle, versions, comments and
//! search.

pub mod comment;
pub mod lifecycle;
pub mod search;
pub mod service;
pub mod version;

use bytes::Bytes;
use serde::Serialize;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_database::repositories::{DocumentFilter, DocumentRepository, DocumentUpdate};
use docvault_entity::document::Document;

pub use comment::{CommentEntry, CommentService, CommentText};
pub use lifecycle::LifecycleService;
pub use search::{SearchField, SearchQuery, SearchResults, SearchService, TagCount};
pub use service::{
    DocumentService, ListDocumentsQuery, SharedDocument, UpdateDocument, UploadDocument,
};
pub use version::{VersionEntry, VersionService};

/// Blob content handed back by downloads.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadedContent {
    /// Raw bytes.
    #[serde(skip)]
    pub data: Bytes,
    /// Suggested filename.
    pub filename: String,
    /// MIME type guessed from the filename.
    pub content_type: &'static str,
    /// Size in bytes.
    pub size: u64,
}

/// Loads a document that is not in the trash.
pub(crate) async fn find_active(repo: &DocumentRepository, id: DocumentId) -> AppResult<Document> {
    repo.find_one(&DocumentFilter::by_id(id).trashed(false))
        .await?
        .ok_or_else(|| AppError::not_found("Document not found"))
}

/// Applies `update` to a document that is still not in the trash.
pub(crate) async fn update_active(
    repo: &DocumentRepository,
    id: DocumentId,
    update: DocumentUpdate,
) -> AppResult<Document> {
    repo.update_one(&DocumentFilter::by_id(id).trashed(false), update)
        .await?
        .ok_or_else(|| AppError::not_found("Document not found"))
}
