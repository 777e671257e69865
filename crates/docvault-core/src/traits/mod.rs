//! Core traits defined in `docvault-core` and implemented by other crates.

pub mod notifier;
pub mod storage;

pub use notifier::Notifier;
pub use storage::{ByteStream, StorageProvider};
