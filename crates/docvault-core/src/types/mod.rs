//! Core type definitions used across the DocVault workspace.

pub mod id;
pub mod notice;
pub mod response;
pub mod sorting;

pub use id::*;
pub use notice::{Notice, NoticeKind};
pub use response::Outcome;
pub use sorting::SortDirection;
