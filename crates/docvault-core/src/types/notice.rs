//! Notification payloads emitted by mutations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{DocumentId, UserId};

/// Category of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// A resource was shared with the recipient.
    Share,
    /// Someone commented on the recipient's document.
    Comment,
    /// Someone edited or versioned the recipient's document.
    Edit,
    /// System message.
    System,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Share => write!(f, "share"),
            Self::Comment => write!(f, "comment"),
            Self::Edit => write!(f, "edit"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A notification request handed to a [`Notifier`](crate::traits::Notifier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    /// Recipient.
    pub recipient: UserId,
    /// Category.
    pub kind: NoticeKind,
    /// Human-readable message.
    pub message: String,
    /// Related document, if any.
    pub document_id: Option<DocumentId>,
    /// Free-form details.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Notice {
    /// Build a notice with no related document.
    pub fn new(recipient: UserId, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            recipient,
            kind,
            message: message.into(),
            document_id: None,
            details: serde_json::Value::Null,
        }
    }

    /// Build a notice about a document.
    pub fn about(
        recipient: UserId,
        kind: NoticeKind,
        document_id: DocumentId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            kind,
            message: message.into(),
            document_id: Some(document_id),
            details: serde_json::Value::Null,
        }
    }

    /// Attach details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
