//! Trash, restore, purge and favorites.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use docvault_auth::acl;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::DocumentId;
use docvault_database::repositories::{
    DocumentFilter, DocumentRepository, DocumentSort, DocumentSortField, DocumentUpdate,
};
use docvault_entity::document::{Activity, ActivityAction, Document};
use docvault_entity::permission::AccessLevel;
use docvault_storage::BlobStore;

use super::{find_active, update_active};
use crate::activity::favorite_state;
use crate::context::RequestContext;

/// Moves documents between the active, trashed and removed states and
/// maintains favorites.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    doc_repo: Arc<DocumentRepository>,
    blobs: Arc<BlobStore>,
}

impl LifecycleService {
    /// Creates a new lifecycle service.
    pub fn new(doc_repo: Arc<DocumentRepository>, blobs: Arc<BlobStore>) -> Self {
        Self { doc_repo, blobs }
    }

    /// Soft-deletes a document. Only the owner may do this.
    pub async fn trash(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<Document> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require_owner(ctx.user_id, &doc)?;

        let now = Utc::now();
        let trashed = update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .trash(now)
                .push_activity(Activity::new(ctx.user_id, ActivityAction::Delete, json!({}))),
        )
        .await?;

        info!(user_id = %ctx.user_id, document_id = %id, "Document moved to trash");
        Ok(trashed)
    }

    /// Brings a trashed document back. Only the owner may do this.
    pub async fn restore(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<Document> {
        let in_trash = DocumentFilter::by_id(id).trashed(true);
        let doc = self
            .doc_repo
            .find_one(&in_trash)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found in trash"))?;
        acl::require_owner(ctx.user_id, &doc)?;

        let restored = self
            .doc_repo
            .update_one(
                &in_trash,
                DocumentUpdate::new()
                    .untrash()
                    .push_activity(Activity::new(ctx.user_id, ActivityAction::Restore, json!({}))),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Document not found in trash"))?;

        info!(user_id = %ctx.user_id, document_id = %id, "Document restored from trash");
        Ok(restored)
    }

    /// The actor's trashed documents, most recently trashed first.
    pub async fn list_trash(&self, ctx: &RequestContext) -> AppResult<Vec<Document>> {
        self.doc_repo
            .find(
                &DocumentFilter::default()
                    .owned_by(ctx.user_id)
                    .trashed(true),
                DocumentSort::desc(DocumentSortField::TrashedAt),
            )
            .await
    }

    /// Permanently deletes every trashed document of the actor, then
    /// removes their blobs. Blob failures are logged and skipped.
    ///
    /// Returns the number of deleted documents.
    pub async fn purge_trash(&self, ctx: &RequestContext) -> AppResult<usize> {
        let trashed = DocumentFilter::default()
            .owned_by(ctx.user_id)
            .trashed(true);
        let removed = self.doc_repo.delete_many(&trashed).await?;

        let mut refs: Vec<String> = Vec::new();
        for doc in &removed {
            for r in doc.blob_refs() {
                if !refs.contains(&r) {
                    refs.push(r);
                }
            }
        }
        let failures = self.blobs.remove_all_best_effort(&refs).await;

        info!(
            user_id = %ctx.user_id,
            deleted = removed.len(),
            blobs = refs.len(),
            blob_failures = failures,
            "Trash emptied"
        );
        Ok(removed.len())
    }

    /// Flips the document's favorite flag and records the change.
    ///
    /// Returns the new value.
    pub async fn toggle_favorite(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<bool> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let is_favorite = !doc.is_favorite;
        let action = if is_favorite {
            ActivityAction::Favorite
        } else {
            ActivityAction::Unfavorite
        };
        update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .set_favorite(is_favorite)
                .push_activity(Activity::new(ctx.user_id, action, json!({}))),
        )
        .await?;

        info!(user_id = %ctx.user_id, document_id = %id, is_favorite, "Favorite toggled");
        Ok(is_favorite)
    }

    /// Accessible, non-trashed documents whose latest favorite event by the
    /// actor is a favorite, most recently favorited first.
    pub async fn list_favorites(&self, ctx: &RequestContext) -> AppResult<Vec<Document>> {
        let docs = self
            .doc_repo
            .find(
                &DocumentFilter::default()
                    .accessible_to(ctx.user_id)
                    .trashed(false),
                DocumentSort::default(),
            )
            .await?;

        let mut favorites: Vec<(chrono::DateTime<Utc>, Document)> = docs
            .into_iter()
            .filter_map(|doc| {
                let event = doc.latest_favorite_event(ctx.user_id)?;
                let at = event.timestamp;
                favorite_state(&doc, ctx.user_id).then_some((at, doc))
            })
            .collect();
        favorites.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(favorites.into_iter().map(|(_, doc)| doc).collect())
    }
}
