//! Document comments.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use validator::Validate;

use docvault_auth::acl;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::Notifier;
use docvault_core::types::id::{CommentId, DocumentId};
use docvault_database::repositories::{DocumentRepository, DocumentUpdate};
use docvault_entity::document::{Activity, ActivityAction, Comment};
use docvault_entity::permission::AccessLevel;

use super::{find_active, update_active};
use crate::context::RequestContext;
use crate::notification::{NotificationRules, deliver};
use crate::request;
use crate::user::UserService;

/// Text of a new or edited comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentText {
    /// Comment body.
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
}

/// A comment with its author's display name.
#[derive(Debug, Clone, Serialize)]
pub struct CommentEntry {
    /// The comment.
    #[serde(flatten)]
    pub comment: Comment,
    /// Display name of the author.
    pub user_name: String,
}

/// Lists, adds, edits and deletes comments.
#[derive(Clone)]
pub struct CommentService {
    doc_repo: Arc<DocumentRepository>,
    users: Arc<UserService>,
    notifier: Arc<dyn Notifier>,
    rules: NotificationRules,
}

impl std::fmt::Debug for CommentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentService").finish_non_exhaustive()
    }
}

impl CommentService {
    /// Creates a new comment service.
    pub fn new(
        doc_repo: Arc<DocumentRepository>,
        users: Arc<UserService>,
        notifier: Arc<dyn Notifier>,
        rules: NotificationRules,
    ) -> Self {
        Self {
            doc_repo,
            users,
            notifier,
            rules,
        }
    }

    /// Comments on a document, newest first.
    pub async fn list(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<Vec<CommentEntry>> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let names = self
            .users
            .display_names(doc.comments.iter().map(|c| c.user_id))
            .await?;
        let mut entries: Vec<CommentEntry> = doc
            .comments
            .into_iter()
            .rev()
            .map(|comment| CommentEntry {
                user_name: names
                    .get(&comment.user_id)
                    .cloned()
                    .unwrap_or_else(|| crate::user::UNKNOWN_USER.to_string()),
                comment,
            })
            .collect();
        entries.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));
        Ok(entries)
    }

    /// Adds a comment. Requires edit access; the owner is notified when
    /// someone else comments.
    pub async fn add(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        req: CommentText,
    ) -> AppResult<Comment> {
        let text = request::required(&req.text, "Comment text")?;
        request::validate(&req)?;
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::Edit)?;

        let comment = Comment::new(ctx.user_id, text);
        let updated = update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .push_comment(comment.clone())
                .push_activity(Activity::new(
                    ctx.user_id,
                    ActivityAction::Comment,
                    json!({ "comment_id": comment.id }),
                )),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            comment_id = %comment.id,
            "Comment added"
        );

        let actor_name = self.users.display_name(ctx.user_id).await?;
        deliver(
            self.notifier.as_ref(),
            self.rules
                .commented(ctx.user_id, &actor_name, &updated, &comment),
        )
        .await;
        Ok(comment)
    }

    /// Replaces a comment's text. Only its author may do this, and only
    /// while they can still view the document.
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        comment_id: CommentId,
        req: CommentText,
    ) -> AppResult<Comment> {
        let text = request::required(&req.text, "Comment text")?;
        request::validate(&req)?;
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;
        let comment = doc
            .comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if comment.user_id != ctx.user_id {
            return Err(AppError::forbidden("Only the author can edit this comment"));
        }

        let updated = update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new().edit_comment(comment_id, text),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            comment_id = %comment_id,
            "Comment edited"
        );
        updated
            .comment(comment_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Comment not found"))
    }

    /// Deletes a comment. Its author, or anyone with admin access to the
    /// document (the owner included), may do this.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        comment_id: CommentId,
    ) -> AppResult<()> {
        let doc = find_active(&self.doc_repo, id).await?;
        let comment = doc
            .comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if comment.user_id != ctx.user_id
            && !acl::authorize(ctx.user_id, &doc, AccessLevel::Admin)
        {
            return Err(AppError::forbidden(
                "Only the author or a document admin can delete this comment",
            ));
        }

        update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new().pull_comment(comment_id),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            comment_id = %comment_id,
            "Comment deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UploadDocument;
    use crate::services::Services;
    use bytes::Bytes;
    use chrono::Utc;
    use docvault_core::error::ErrorKind;
    use docvault_core::types::id::UserId;
    use docvault_core::types::{Notice, NoticeKind};
    use docvault_database::repositories::DocumentFilter;
    use docvault_entity::document::Document;
    use docvault_entity::permission::PermissionEntry;

    #[derive(Debug)]
    struct OfflineInbox;

    #[async_trait::async_trait]
    impl Notifier for OfflineInbox {
        async fn notify(&self, _notice: Notice) -> AppResult<()> {
            Err(AppError::internal("inbox offline"))
        }
    }

    fn text(t: &str) -> CommentText {
        CommentText { text: t.into() }
    }

    async fn setup() -> (Services, RequestContext, RequestContext, Document) {
        let services = Services::in_memory();
        let owner = RequestContext::new(UserId::new());
        let editor = RequestContext::new(UserId::new());
        let doc = services
            .documents
            .upload(
                &owner,
                UploadDocument {
                    filename: "notes.txt".into(),
                    title: Some("Notes".into()),
                    ..UploadDocument::default()
                },
                Bytes::from_static(b"n"),
            )
            .await
            .unwrap();
        services
            .document_repo()
            .update_one(
                &DocumentFilter::by_id(doc.id),
                DocumentUpdate::new().upsert_permission(PermissionEntry {
                    user_id: editor.user_id,
                    access_level: AccessLevel::Edit,
                    granted_at: Utc::now(),
                    granted_by: owner.user_id,
                }),
            )
            .await
            .unwrap();
        (services, owner, editor, doc)
    }

    #[tokio::test]
    async fn test_comment_notifies_owner() {
        let (services, owner, editor, doc) = setup().await;
        services
            .comments
            .add(&editor, doc.id, text("Looks good"))
            .await
            .unwrap();

        let inbox = services
            .notifications
            .list(&owner, false, None)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NoticeKind::Comment);
        assert_eq!(inbox[0].document_id, Some(doc.id));

        services
            .comments
            .add(&owner, doc.id, text("Thanks"))
            .await
            .unwrap();
        let inbox = services
            .notifications
            .list(&owner, false, None)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);

        let listed = services.comments.list(&owner, doc.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].comment.text, "Thanks");
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let (services, owner, _editor, doc) = setup().await;
        let err = services
            .comments
            .add(&owner, doc.id, text("   "))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_only_author_edits_but_owner_deletes() {
        let (services, owner, editor, doc) = setup().await;
        let comment = services
            .comments
            .add(&editor, doc.id, text("draft"))
            .await
            .unwrap();

        let err = services
            .comments
            .edit(&owner, doc.id, comment.id, text("hijack"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let edited = services
            .comments
            .edit(&editor, doc.id, comment.id, text("final"))
            .await
            .unwrap();
        assert_eq!(edited.text, "final");

        services
            .comments
            .delete(&owner, doc.id, comment.id)
            .await
            .unwrap();
        let remaining = services.comments.list(&owner, doc.id).await.unwrap();
        assert!(remaining.is_empty());

        let err = services
            .comments
            .delete(&owner, doc.id, comment.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_comment_kept_when_notice_fails() {
        let (services, owner, editor, doc) = setup().await;
        let comments = CommentService::new(
            Arc::clone(services.document_repo()),
            Arc::clone(&services.users),
            Arc::new(OfflineInbox),
            NotificationRules::new(50),
        );

        let comment = comments
            .add(&editor, doc.id, text("saved anyway"))
            .await
            .unwrap();

        let listed = services.comments.list(&owner, doc.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].comment.id, comment.id);
        let inbox = services
            .notifications
            .list(&owner, false, None)
            .await
            .unwrap();
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn test_revoked_author_cannot_edit() {
        let (services, owner, editor, doc) = setup().await;
        let comment = services
            .comments
            .add(&editor, doc.id, text("draft"))
            .await
            .unwrap();
        services
            .document_repo()
            .update_one(
                &DocumentFilter::by_id(doc.id),
                DocumentUpdate::new().pull_permission(editor.user_id),
            )
            .await
            .unwrap();

        let err = services
            .comments
            .edit(&editor, doc.id, comment.id, text("rewritten"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let listed = services.comments.list(&owner, doc.id).await.unwrap();
        assert_eq!(listed[0].comment.text, "draft");
    }
}
