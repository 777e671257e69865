//! Notification sink used by the mutating services.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Notice;

/// Delivers notices to their recipients.
///
/// Callers raise notices after their mutation is applied; a failed
/// delivery does not undo it.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Record a notice for its recipient.
    async fn notify(&self, notice: Notice) -> AppResult<()>;
}
