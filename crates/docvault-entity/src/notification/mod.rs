//! Notification domain entities.

pub mod model;

pub use docvault_core::types::NoticeKind;
pub use model::Notification;
