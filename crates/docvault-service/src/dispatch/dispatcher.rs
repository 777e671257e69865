//! Routes operations to services and wraps the result in an [`Outcome`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_core::types::{Notice, NoticeKind, Outcome};

use super::operation::Operation;
use crate::context::RequestContext;
use crate::document::{CommentText, DownloadedContent};
use crate::notification::deliver;
use crate::services::Services;
use crate::user::UserSummary;

/// Single entry point for every operation.
///
/// Each call runs in isolation: an error or a panic inside one call is
/// turned into an error outcome and does not affect later calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    services: Arc<Services>,
}

impl Dispatcher {
    /// Creates a dispatcher over `services`.
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    /// The services behind this dispatcher.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Parses `payload` as an [`Operation`] and dispatches it.
    pub async fn dispatch_json(&self, actor: UserId, payload: Value) -> Outcome {
        match serde_json::from_value::<Operation>(payload) {
            Ok(op) => self.dispatch(actor, op).await,
            Err(e) => AppError::validation(format!("Invalid operation: {e}")).into(),
        }
    }

    /// Runs `op` on behalf of `actor`.
    pub async fn dispatch(&self, actor: UserId, op: Operation) -> Outcome {
        let ctx = RequestContext::new(actor);
        let name = op.name();
        debug!(user_id = %actor, op = name, "Dispatching operation");

        match AssertUnwindSafe(self.route(&ctx, op)).catch_unwind().await {
            Ok(result) => {
                match &result {
                    Err(e) if e.kind.is_client_error() => {
                        debug!(user_id = %actor, op = name, error = %e, "Operation rejected");
                    }
                    Err(e) => {
                        warn!(user_id = %actor, op = name, error = %e, "Operation failed");
                    }
                    Ok(_) => {}
                }
                result.into()
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(user_id = %actor, op = name, detail = %detail, "Operation panicked");
                AppError::internal("Unexpected failure while handling the operation").into()
            }
        }
    }

    async fn route(&self, ctx: &RequestContext, op: Operation) -> AppResult<Value> {
        let s = &self.services;
        match op {
            Operation::RegisterUser(data) => {
                to_json(UserSummary::from(&s.users.register(data).await?))
            }
            Operation::GetUser { user_id } => {
                to_json(UserSummary::from(&s.users.get(user_id).await?))
            }
            Operation::ListUsers => {
                let users = s.users.list().await?;
                to_json(users.iter().map(UserSummary::from).collect::<Vec<_>>())
            }
            Operation::IssueResetToken { email } => {
                let token = s.resets.issue(&email).await?;
                let notice = Notice::new(
                    token.user_id,
                    NoticeKind::System,
                    format!("Your password reset code is {}", token.code),
                )
                .with_details(json!({ "code": token.code, "expires_at": token.expires_at }));
                deliver(s.notifications.as_ref(), Some(notice)).await;
                Ok(json!({ "email": email, "expires_at": token.expires_at }))
            }
            Operation::RedeemResetToken { code } => {
                let user_id = s.resets.redeem(&code).await?;
                Ok(json!({ "user_id": user_id }))
            }

            Operation::UploadDocument { request, content } => {
                let data = decode(&content)?;
                to_json(s.documents.upload(ctx, request, data).await?)
            }
            Operation::GetDocument { document_id } => {
                to_json(s.documents.get(ctx, document_id).await?)
            }
            Operation::UpdateDocument {
                document_id,
                changes,
            } => to_json(s.documents.update(ctx, document_id, changes).await?),
            Operation::DownloadDocument { document_id } => {
                Ok(encode(s.documents.download(ctx, document_id).await?))
            }
            Operation::ListDocuments(query) => {
                to_json(s.documents.list_documents(ctx, query).await?)
            }
            Operation::ListShared => to_json(s.documents.list_shared(ctx).await?),
            Operation::ListRecent => to_json(s.documents.list_recent(ctx).await?),

            Operation::TrashDocument { document_id } => {
                let doc = s.lifecycle.trash(ctx, document_id).await?;
                Ok(json!({ "message": "File moved to trash", "document": doc }))
            }
            Operation::RestoreDocument { document_id } => {
                let doc = s.lifecycle.restore(ctx, document_id).await?;
                Ok(json!({ "message": "File restored", "document": doc }))
            }
            Operation::ListTrash => to_json(s.lifecycle.list_trash(ctx).await?),
            Operation::EmptyTrash => {
                let deleted = s.lifecycle.purge_trash(ctx).await?;
                Ok(json!({ "deleted": deleted }))
            }
            Operation::ToggleFavorite { document_id } => {
                let is_favorite = s.lifecycle.toggle_favorite(ctx, document_id).await?;
                Ok(json!({ "is_favorite": is_favorite }))
            }
            Operation::ListFavorites => to_json(s.lifecycle.list_favorites(ctx).await?),

            Operation::AddVersion {
                document_id,
                filename,
                content,
            } => {
                let data = decode(&content)?;
                to_json(
                    s.versions
                        .add_version(ctx, document_id, data, &filename)
                        .await?,
                )
            }
            Operation::RestoreVersion {
                document_id,
                version_id,
            } => {
                let (doc, version) = s
                    .versions
                    .restore_version(ctx, document_id, version_id)
                    .await?;
                Ok(json!({
                    "message": format!("Restored to version {}", version.version_number),
                    "document": doc,
                    "version": version,
                }))
            }
            Operation::ListVersions { document_id } => {
                to_json(s.versions.list_versions(ctx, document_id).await?)
            }
            Operation::ReadVersion {
                document_id,
                version_id,
            } => {
                let content = s.versions.read_version(ctx, document_id, version_id).await?;
                Ok(encode(content))
            }

            Operation::ListComments { document_id } => {
                to_json(s.comments.list(ctx, document_id).await?)
            }
            Operation::AddComment { document_id, text } => to_json(
                s.comments
                    .add(ctx, document_id, CommentText { text })
                    .await?,
            ),
            Operation::EditComment {
                document_id,
                comment_id,
                text,
            } => to_json(
                s.comments
                    .edit(ctx, document_id, comment_id, CommentText { text })
                    .await?,
            ),
            Operation::DeleteComment {
                document_id,
                comment_id,
            } => {
                s.comments.delete(ctx, document_id, comment_id).await?;
                Ok(json!({ "message": "Comment deleted" }))
            }

            Operation::ShareDocument {
                document_id,
                request,
            } => to_json(s.sharing.share_document(ctx, document_id, request).await?),
            Operation::RevokeDocument {
                document_id,
                grantee,
            } => {
                s.sharing.revoke_document(ctx, document_id, grantee).await?;
                Ok(json!({ "message": "Access revoked" }))
            }
            Operation::DocumentPermissions { document_id } => {
                to_json(s.sharing.document_permissions(ctx, document_id).await?)
            }
            Operation::ShareFolder { folder_id, request } => {
                to_json(s.sharing.share_folder(ctx, folder_id, request).await?)
            }
            Operation::RevokeFolder { folder_id, grantee } => {
                s.sharing.revoke_folder(ctx, folder_id, grantee).await?;
                Ok(json!({ "message": "Access revoked" }))
            }
            Operation::FolderPermissions { folder_id } => {
                to_json(s.sharing.folder_permissions(ctx, folder_id).await?)
            }

            Operation::CreateFolder(req) => to_json(s.folders.create(ctx, req).await?),
            Operation::ListFolders { parent_id } => to_json(s.folders.list(ctx, parent_id).await?),
            Operation::GetFolder { folder_id } => to_json(s.folders.get(ctx, folder_id).await?),
            Operation::FolderContents { folder_id } => {
                to_json(s.folders.contents(ctx, folder_id).await?)
            }
            Operation::UpdateFolder { folder_id, changes } => {
                to_json(s.folders.update(ctx, folder_id, changes).await?)
            }
            Operation::TrashFolder { folder_id } => to_json(s.folders.trash(ctx, folder_id).await?),

            Operation::RecordActivity {
                document_id,
                action,
                details,
            } => to_json(s.activity.record(ctx, document_id, &action, details).await?),
            Operation::DocumentActivity { document_id } => {
                to_json(s.activity.document_activity(ctx, document_id).await?)
            }
            Operation::UserActivity => to_json(s.activity.user_activity(ctx).await?),
            Operation::Statistics => to_json(s.activity.statistics(ctx).await?),
            Operation::FavoriteState { document_id } => {
                let is_favorite = s.activity.favorite_state(ctx, document_id).await?;
                Ok(json!({ "is_favorite": is_favorite }))
            }

            Operation::ListNotifications { unread_only, limit } => {
                to_json(s.notifications.list(ctx, unread_only, limit).await?)
            }
            Operation::UnreadCount => {
                let count = s.notifications.unread_count(ctx).await?;
                Ok(json!({ "count": count }))
            }
            Operation::MarkNotificationsRead { ids } => {
                let marked = s.notifications.mark_read(ctx, ids.as_deref()).await?;
                Ok(json!({ "marked": marked }))
            }

            Operation::Search(query) => to_json(s.search.search(ctx, query).await?),
            Operation::ListTags => to_json(s.search.tags(ctx).await?),
        }
    }
}

fn to_json<T: Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn decode(content: &str) -> AppResult<Bytes> {
    BASE64
        .decode(content.trim())
        .map(Bytes::from)
        .map_err(|e| {
            AppError::validation(format!("Content is not valid base64: {e}"))
        })
}

fn encode(content: DownloadedContent) -> Value {
    json!({
        "filename": content.filename,
        "content_type": content.content_type,
        "size": content.size,
        "content": BASE64.encode(&content.data),
    })
}
