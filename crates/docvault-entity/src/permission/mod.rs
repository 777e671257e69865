//! Per-user access grants on documents and folders.

pub mod level;
pub mod model;

pub use level::AccessLevel;
pub use model::{AccessControlled, PermissionEntry};
