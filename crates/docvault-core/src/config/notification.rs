//! Notification configuration.

use serde::{Deserialize, Serialize};

/// Notification listing and message settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Default number of notifications returned by a listing.
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
    /// Characters of comment text quoted in a comment notification.
    #[serde(default = "default_comment_preview_chars")]
    pub comment_preview_chars: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_list_limit: default_list_limit(),
            comment_preview_chars: default_comment_preview_chars(),
        }
    }
}

fn default_list_limit() -> usize {
    50
}

fn default_comment_preview_chars() -> usize {
    50
}
