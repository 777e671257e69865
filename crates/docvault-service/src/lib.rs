//! # docvault-service
//!
//! Business logic for DocVault. Each service works over the record store,
//! the blob store and the access evaluator to implement one group of
//! operations: document lifecycle, versions, comments, sharing, folders,
//! activity, notifications and search.
//!
//! Services take every dependency at construction time as an `Arc`.
//! [`Services`] wires the whole graph and [`Dispatcher`] exposes it behind
//! a single tagged-operation entry point.

pub mod activity;
pub mod context;
pub mod dispatch;
pub mod document;
pub mod folder;
pub mod notification;
pub mod request;
pub mod services;
pub mod share;
pub mod user;

pub use activity::ActivityService;
pub use context::RequestContext;
pub use dispatch::{Dispatcher, Operation};
pub use document::{
    CommentService, DocumentService, LifecycleService, SearchService, VersionService,
};
pub use folder::FolderService;
pub use notification::{NotificationRules, NotificationService};
pub use services::Services;
pub use share::ShareService;
pub use user::UserService;
