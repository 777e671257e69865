//! Service graph wired from configuration, a record store and a blob store.

use std::sync::Arc;

use docvault_auth::PasswordResetService;
use docvault_core::config::AppConfig;
use docvault_core::result::AppResult;
use docvault_core::traits::Notifier;
use docvault_database::Database;
use docvault_database::repositories::{
    DocumentRepository, FolderRepository, NotificationRepository, ResetTokenRepository,
    UserRepository,
};
use docvault_storage::BlobStore;
use docvault_storage::providers::MemoryStorageProvider;

use crate::activity::ActivityService;
use crate::document::{
    CommentService, DocumentService, LifecycleService, SearchService, VersionService,
};
use crate::folder::FolderService;
use crate::notification::{NotificationRules, NotificationService};
use crate::share::ShareService;
use crate::user::UserService;

/// Every service, sharing one record store and one blob store.
///
/// Cloning is cheap; all fields are `Arc`-wrapped.
#[derive(Debug, Clone)]
pub struct Services {
    // ── Infrastructure ───────────────────────────────────────
    /// Record store.
    pub db: Database,
    /// Blob store.
    pub blobs: Arc<BlobStore>,

    // ── Identity ─────────────────────────────────────────────
    /// User registration and display names.
    pub users: Arc<UserService>,
    /// Password reset codes.
    pub resets: Arc<PasswordResetService>,
    /// Notification inbox; also the notifier of every other service.
    pub notifications: Arc<NotificationService>,

    // ── Documents ────────────────────────────────────────────
    /// Upload, view, edit, download and listings.
    pub documents: Arc<DocumentService>,
    /// Trash, restore, purge and favorites.
    pub lifecycle: Arc<LifecycleService>,
    /// Version chains.
    pub versions: Arc<VersionService>,
    /// Comments.
    pub comments: Arc<CommentService>,
    /// Metadata search and tags.
    pub search: Arc<SearchService>,
    /// Activity log, feeds and statistics.
    pub activity: Arc<ActivityService>,

    // ── Folders & sharing ────────────────────────────────────
    /// Folder tree.
    pub folders: Arc<FolderService>,
    /// Grants on documents and folders.
    pub sharing: Arc<ShareService>,

    doc_repo: Arc<DocumentRepository>,
    folder_repo: Arc<FolderRepository>,
}

impl Services {
    /// Wires every service over `db` and `blobs`.
    pub fn new(config: &AppConfig, db: Database, blobs: BlobStore) -> Self {
        let blobs = Arc::new(blobs);
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let doc_repo = Arc::new(DocumentRepository::new(db.clone()));
        let folder_repo = Arc::new(FolderRepository::new(db.clone()));
        let notif_repo = Arc::new(NotificationRepository::new(db.clone()));
        let token_repo = Arc::new(ResetTokenRepository::new(db.clone()));

        let rules = NotificationRules::new(config.notifications.comment_preview_chars);
        let users = Arc::new(UserService::new(Arc::clone(&user_repo)));
        let notifications = Arc::new(NotificationService::new(notif_repo, &config.notifications));
        let notifier: Arc<dyn Notifier> = notifications.clone();

        let documents = Arc::new(DocumentService::new(
            Arc::clone(&doc_repo),
            Arc::clone(&folder_repo),
            Arc::clone(&users),
            Arc::clone(&blobs),
            Arc::clone(&notifier),
            rules.clone(),
            &config.activity,
        ));
        let lifecycle = Arc::new(LifecycleService::new(
            Arc::clone(&doc_repo),
            Arc::clone(&blobs),
        ));
        let versions = Arc::new(VersionService::new(
            Arc::clone(&doc_repo),
            Arc::clone(&users),
            Arc::clone(&blobs),
            Arc::clone(&notifier),
            rules.clone(),
        ));
        let comments = Arc::new(CommentService::new(
            Arc::clone(&doc_repo),
            Arc::clone(&users),
            Arc::clone(&notifier),
            rules.clone(),
        ));
        let search = Arc::new(SearchService::new(Arc::clone(&doc_repo), &config.search));
        let activity = Arc::new(ActivityService::new(
            Arc::clone(&doc_repo),
            Arc::clone(&users),
            &config.activity,
        ));
        let folders = Arc::new(FolderService::new(
            Arc::clone(&folder_repo),
            Arc::clone(&doc_repo),
        ));
        let sharing = Arc::new(ShareService::new(
            Arc::clone(&doc_repo),
            Arc::clone(&folder_repo),
            Arc::clone(&users),
            notifier,
            rules,
        ));
        let resets = Arc::new(PasswordResetService::new(
            token_repo,
            user_repo,
            &config.auth,
        ));

        Self {
            db,
            blobs,
            users,
            resets,
            notifications,
            documents,
            lifecycle,
            versions,
            comments,
            search,
            activity,
            folders,
            sharing,
            doc_repo,
            folder_repo,
        }
    }

    /// Opens the configured record store snapshot and blob root.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let db = Database::open(&config.database).await?;
        let blobs = BlobStore::from_config(&config.storage).await?;
        Ok(Self::new(config, db, blobs))
    }

    /// Services over an empty in-memory store with default configuration.
    pub fn in_memory() -> Self {
        let config = AppConfig::default();
        let blobs = BlobStore::new(
            Arc::new(MemoryStorageProvider::new()),
            config.storage.max_upload_size_bytes,
        );
        Self::new(&config, Database::in_memory(), blobs)
    }

    /// Direct access to the document records.
    pub fn document_repo(&self) -> &Arc<DocumentRepository> {
        &self.doc_repo
    }

    /// Direct access to the folder records.
    pub fn folder_repo(&self) -> &Arc<FolderRepository> {
        &self.folder_repo
    }
}
