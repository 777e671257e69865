//! Document activity log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use docvault_core::types::id::{ActivityId, UserId};

/// Closed vocabulary of logged document actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    /// Document opened.
    View,
    /// Metadata edited.
    Edit,
    /// Content downloaded.
    Download,
    /// Access granted.
    Share,
    /// Access revoked.
    Unshare,
    /// Moved to trash.
    Delete,
    /// Restored from trash, or an old version restored.
    Restore,
    /// New version uploaded.
    Version,
    /// Comment added.
    Comment,
    /// Marked as favorite.
    Favorite,
    /// Favorite mark removed.
    Unfavorite,
    /// Initial upload.
    Upload,
}

impl ActivityAction {
    /// Return the action as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Download => "download",
            Self::Share => "share",
            Self::Unshare => "unshare",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::Version => "version",
            Self::Comment => "comment",
            Self::Favorite => "favorite",
            Self::Unfavorite => "unfavorite",
            Self::Upload => "upload",
        }
    }

    /// Whether this action toggles the favorite mark.
    pub fn is_favorite_toggle(&self) -> bool {
        matches!(self, Self::Favorite | Self::Unfavorite)
    }

    /// Whether this action only reads the document.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::View | Self::Download)
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "download" => Ok(Self::Download),
            "share" => Ok(Self::Share),
            "unshare" => Ok(Self::Unshare),
            "delete" => Ok(Self::Delete),
            "restore" => Ok(Self::Restore),
            "version" => Ok(Self::Version),
            "comment" => Ok(Self::Comment),
            "favorite" => Ok(Self::Favorite),
            "unfavorite" => Ok(Self::Unfavorite),
            "upload" => Ok(Self::Upload),
            _ => Err(docvault_core::AppError::validation(format!(
                "Unknown activity action: '{s}'"
            ))),
        }
    }
}

/// One append-only activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique entry identifier.
    pub id: ActivityId,
    /// The acting user.
    pub user_id: UserId,
    /// What happened.
    pub action: ActivityAction,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Action-specific details.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Activity {
    /// Create an entry stamped now.
    pub fn new(user_id: UserId, action: ActivityAction, details: serde_json::Value) -> Self {
        Self {
            id: ActivityId::new(),
            user_id,
            action,
            timestamp: Utc::now(),
            details,
        }
    }
}
