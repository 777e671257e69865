//! Repository implementations for all DocVault entities.

pub mod document;
pub mod folder;
pub mod notification;
pub mod permission;
pub mod reset_token;
pub mod user;

pub use document::{
    DocumentFilter, DocumentRepository, DocumentSort, DocumentSortField, DocumentUpdate,
};
pub use folder::{FolderFilter, FolderRepository, FolderUpdate};
pub use notification::NotificationRepository;
pub use reset_token::ResetTokenRepository;
pub use user::UserRepository;
