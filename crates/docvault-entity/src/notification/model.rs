//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::{DocumentId, NotificationId, UserId};
use docvault_core::types::{Notice, NoticeKind};

/// A notification delivered to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// Notification category.
    pub kind: NoticeKind,
    /// Notification body text.
    pub message: String,
    /// Related document, if any.
    pub document_id: Option<DocumentId>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// Whether the recipient has read this notification.
    #[serde(default)]
    pub is_read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Additional structured data.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Notification {
    /// Materialize a notice as an unread notification.
    pub fn from_notice(notice: Notice) -> Self {
        Self {
            id: NotificationId::new(),
            user_id: notice.recipient,
            kind: notice.kind,
            message: notice.message,
            document_id: notice.document_id,
            created_at: Utc::now(),
            is_read: false,
            read_at: None,
            details: notice.details,
        }
    }

    /// Check if the notification has not been read.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}
