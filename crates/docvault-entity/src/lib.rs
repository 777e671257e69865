//! # docvault-entity
//!
//! Domain entity models for DocVault. Documents are aggregates: their
//! permission entries, versions, comments and activities are owned value
//! objects stored inside the document record. All entities derive
//! `Debug`, `Clone`, `Serialize` and `Deserialize`.

pub mod document;
pub mod folder;
pub mod notification;
pub mod permission;
pub mod token;
pub mod user;
