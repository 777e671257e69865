//! # docvault-core
//!
//! Core crate for DocVault. Contains the collaborator traits (blob storage,
//! notification delivery), configuration schemas, typed identifiers,
//! sorting and response types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DocVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
