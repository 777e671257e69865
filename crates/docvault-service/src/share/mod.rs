//! Grants on documents and folders.

pub mod service;

pub use service::{Grantee, PermissionList, PermissionView, ShareRequest, ShareService};
