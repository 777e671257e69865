//! # docvault-database
//!
//! In-memory record store and the concrete repositories for every DocVault
//! entity. Records are grouped in `dashmap` collections; the store can be
//! persisted to a JSON snapshot between process runs.

pub mod collection;
pub mod connection;
pub mod repositories;

pub use connection::Database;
