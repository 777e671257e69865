//! Recipient and message rules for mutation side effects.
//!
//! Every rule returns `None` when the actor is the recipient, so an owner
//! acting on their own document is never notified.

use serde_json::json;

use docvault_core::types::id::UserId;
use docvault_core::types::{Notice, NoticeKind};
use docvault_entity::document::{Comment, Document};
use docvault_entity::folder::Folder;
use docvault_entity::permission::AccessLevel;

/// Builds the notices emitted by sharing, commenting, editing and
/// versioning.
#[derive(Debug, Clone)]
pub struct NotificationRules {
    comment_preview_chars: usize,
}

impl NotificationRules {
    /// Creates the rules with the given comment preview length.
    pub fn new(comment_preview_chars: usize) -> Self {
        Self {
            comment_preview_chars,
        }
    }

    /// Tells the grantee a document was shared with them.
    pub fn document_shared(
        &self,
        actor: UserId,
        actor_name: &str,
        doc: &Document,
        grantee: UserId,
        level: AccessLevel,
    ) -> Option<Notice> {
        if actor == grantee {
            return None;
        }
        Some(
            Notice::about(
                grantee,
                NoticeKind::Share,
                doc.id,
                format!("{actor_name} shared '{}' with you", doc.title),
            )
            .with_details(json!({ "access_level": level })),
        )
    }

    /// Tells the grantee a folder was shared with them.
    pub fn folder_shared(
        &self,
        actor: UserId,
        actor_name: &str,
        folder: &Folder,
        grantee: UserId,
        level: AccessLevel,
    ) -> Option<Notice> {
        if actor == grantee {
            return None;
        }
        Some(
            Notice::new(
                grantee,
                NoticeKind::Share,
                format!("{actor_name} shared folder '{}' with you", folder.name),
            )
            .with_details(json!({ "folder_id": folder.id, "access_level": level })),
        )
    }

    /// Tells the owner someone commented on their document.
    pub fn commented(
        &self,
        actor: UserId,
        actor_name: &str,
        doc: &Document,
        comment: &Comment,
    ) -> Option<Notice> {
        if actor == doc.owner_id {
            return None;
        }
        Some(
            Notice::about(
                doc.owner_id,
                NoticeKind::Comment,
                doc.id,
                format!("{actor_name} commented on your file '{}'", doc.title),
            )
            .with_details(json!({
                "comment_id": comment.id,
                "comment_text": comment.preview(self.comment_preview_chars),
            })),
        )
    }

    /// Tells the owner someone edited their document's metadata.
    pub fn edited(
        &self,
        actor: UserId,
        actor_name: &str,
        doc: &Document,
        fields_updated: &[&str],
    ) -> Option<Notice> {
        if actor == doc.owner_id {
            return None;
        }
        Some(
            Notice::about(
                doc.owner_id,
                NoticeKind::Edit,
                doc.id,
                format!("{actor_name} edited your file '{}'", doc.title),
            )
            .with_details(json!({ "fields_updated": fields_updated })),
        )
    }

    /// Tells the owner someone added a version to their document.
    pub fn versioned(
        &self,
        actor: UserId,
        actor_name: &str,
        doc: &Document,
        version_number: u32,
    ) -> Option<Notice> {
        if actor == doc.owner_id {
            return None;
        }
        Some(
            Notice::about(
                doc.owner_id,
                NoticeKind::Edit,
                doc.id,
                format!(
                    "{actor_name} added a new version to your file '{}'",
                    doc.title
                ),
            )
            .with_details(json!({ "version_number": version_number })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_entity::document::{CreateDocument, DocumentVersion};

    fn doc(owner: UserId) -> Document {
        Document::create(
            CreateDocument {
                title: "Budget".into(),
                description: String::new(),
                author: "Olga".into(),
                tags: vec![],
                original_filename: "budget.xlsx".into(),
                owner_id: owner,
                folder_id: None,
            },
            DocumentVersion::new(1, "a.xlsx", 3, owner),
        )
    }

    #[test]
    fn test_owner_acting_is_silent() {
        let rules = NotificationRules::new(50);
        let owner = UserId::new();
        let d = doc(owner);
        assert!(rules.versioned(owner, "Olga", &d, 2).is_none());
        assert!(rules.edited(owner, "Olga", &d, &["title"]).is_none());
    }

    #[test]
    fn test_comment_preview_is_truncated() {
        let rules = NotificationRules::new(10);
        let owner = UserId::new();
        let actor = UserId::new();
        let d = doc(owner);
        let comment = Comment::new(actor, "This quarter looks much better than the last one");

        let notice = rules.commented(actor, "Ann", &d, &comment).unwrap();
        assert_eq!(notice.recipient, owner);
        assert_eq!(notice.kind, NoticeKind::Comment);
        assert_eq!(notice.message, "Ann commented on your file 'Budget'");
        assert_eq!(notice.details["comment_text"], "This quart...");
    }

    #[test]
    fn test_share_message_names_actor_and_title() {
        let rules = NotificationRules::new(50);
        let owner = UserId::new();
        let grantee = UserId::new();
        let notice = rules
            .document_shared(owner, "Olga", &doc(owner), grantee, AccessLevel::Edit)
            .unwrap();
        assert_eq!(notice.message, "Olga shared 'Budget' with you");
        assert_eq!(notice.details["access_level"], "edit");
    }
}
