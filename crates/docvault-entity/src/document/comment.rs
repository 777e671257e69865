//! Document comment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::{CommentId, UserId};

/// A comment left on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment identifier.
    pub id: CommentId,
    /// Author of the comment.
    pub user_id: UserId,
    /// Comment text.
    pub text: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
    /// When the comment was last edited.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment authored now.
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CommentId::new(),
            user_id,
            text: text.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Text cut to `max_chars` characters, with `...` appended when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() > max_chars {
            let cut: String = self.text.chars().take(max_chars).collect();
            format!("{cut}...")
        } else {
            self.text.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        let short = Comment::new(UserId::new(), "looks good");
        assert_eq!(short.preview(50), "looks good");

        let long = Comment::new(UserId::new(), "é".repeat(60));
        let preview = long.preview(50);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 53);
    }
}
