//! Folder tree management.

pub mod service;

pub use service::{
    CreateFolderRequest, FolderContents, FolderDetail, FolderService, FolderTrashSummary,
    UpdateFolderRequest,
};
