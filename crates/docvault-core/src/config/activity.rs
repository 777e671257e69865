//! Activity feed configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to the activity feeds and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Maximum entries in a user's merged activity feed.
    #[serde(default = "default_user_feed_limit")]
    pub user_feed_limit: usize,
    /// Maximum recent-activity entries in the statistics summary.
    #[serde(default = "default_statistics_limit")]
    pub statistics_limit: usize,
    /// Window, in days, of the statistics recent-activity list.
    #[serde(default = "default_statistics_window_days")]
    pub statistics_window_days: i64,
    /// Maximum entries in the recently-opened listing.
    #[serde(default = "default_recent_files_limit")]
    pub recent_files_limit: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            user_feed_limit: default_user_feed_limit(),
            statistics_limit: default_statistics_limit(),
            statistics_window_days: default_statistics_window_days(),
            recent_files_limit: default_recent_files_limit(),
        }
    }
}

fn default_user_feed_limit() -> usize {
    50
}

fn default_statistics_limit() -> usize {
    20
}

fn default_statistics_window_days() -> i64 {
    7
}

fn default_recent_files_limit() -> usize {
    10
}
