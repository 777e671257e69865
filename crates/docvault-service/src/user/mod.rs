//! User display identity services.

pub mod service;

pub use service::{UNKNOWN_USER, UserService, UserSummary};
