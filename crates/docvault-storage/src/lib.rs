//! # docvault-storage
//!
//! Blob storage for DocVault: the local filesystem provider, an in-process
//! provider, and the [`BlobStore`] that names, limits and cleans up
//! document blobs.

pub mod blob;
pub mod content_type;
pub mod providers;

pub use blob::{BlobStore, StoredBlob};
pub use content_type::content_type_for;
