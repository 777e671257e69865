//! Notification delivery, listing and recipient rules.

pub mod rules;
pub mod service;

pub use rules::NotificationRules;
pub use service::NotificationService;

use tracing::warn;

use docvault_core::traits::Notifier;
use docvault_core::types::Notice;

/// Hands `notice` to `notifier` when a rule produced one.
///
/// The mutation that raised the notice is already applied, so a delivery
/// failure is logged rather than returned.
pub(crate) async fn deliver(notifier: &dyn Notifier, notice: Option<Notice>) {
    let Some(notice) = notice else {
        return;
    };
    let (recipient, kind) = (notice.recipient, notice.kind);
    if let Err(e) = notifier.notify(notice).await {
        warn!(recipient = %recipient, kind = %kind, error = %e, "Notification not delivered");
    }
}
