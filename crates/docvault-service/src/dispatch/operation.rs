//! Inbound operation vocabulary.

use serde::{Deserialize, Serialize};

use docvault_core::types::id::{CommentId, DocumentId, FolderId, NotificationId, UserId, VersionId};
use docvault_entity::user::CreateUser;

use crate::document::{ListDocumentsQuery, SearchQuery, UpdateDocument, UploadDocument};
use crate::folder::{CreateFolderRequest, UpdateFolderRequest};
use crate::share::{Grantee, ShareRequest};

/// One call into the system, tagged by `op`.
///
/// Blob bodies (`content`) travel as standard base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Register a user.
    RegisterUser(CreateUser),
    /// Look up a user.
    GetUser {
        /// User ID.
        user_id: UserId,
    },
    /// All registered users.
    ListUsers,
    /// Issue a password reset code, delivered to the account's inbox.
    IssueResetToken {
        /// Email of the account.
        email: String,
    },
    /// Redeem a password reset code.
    RedeemResetToken {
        /// The code.
        code: String,
    },

    /// Upload a new document.
    UploadDocument {
        /// Metadata.
        #[serde(flatten)]
        request: UploadDocument,
        /// Base64 body.
        content: String,
    },
    /// Open a document.
    GetDocument {
        /// Document ID.
        document_id: DocumentId,
    },
    /// Change document metadata.
    UpdateDocument {
        /// Document ID.
        document_id: DocumentId,
        /// Changes.
        #[serde(flatten)]
        changes: UpdateDocument,
    },
    /// Read a document's active content.
    DownloadDocument {
        /// Document ID.
        document_id: DocumentId,
    },
    /// The actor's documents.
    ListDocuments(ListDocumentsQuery),
    /// Documents granted to the actor.
    ListShared,
    /// Recently opened documents.
    ListRecent,

    /// Move a document to the trash.
    TrashDocument {
        /// Document ID.
        document_id: DocumentId,
    },
    /// Bring a document back from the trash.
    RestoreDocument {
        /// Document ID.
        document_id: DocumentId,
    },
    /// The actor's trashed documents.
    ListTrash,
    /// Permanently delete the actor's trashed documents.
    EmptyTrash,
    /// Flip the favorite flag.
    ToggleFavorite {
        /// Document ID.
        document_id: DocumentId,
    },
    /// The actor's favorites.
    ListFavorites,

    /// Store a new version.
    AddVersion {
        /// Document ID.
        document_id: DocumentId,
        /// Filename of the new content.
        filename: String,
        /// Base64 body.
        content: String,
    },
    /// Make an older version current.
    RestoreVersion {
        /// Document ID.
        document_id: DocumentId,
        /// Version ID.
        version_id: VersionId,
    },
    /// Versions of a document.
    ListVersions {
        /// Document ID.
        document_id: DocumentId,
    },
    /// Read one version.
    ReadVersion {
        /// Document ID.
        document_id: DocumentId,
        /// Version ID.
        version_id: VersionId,
    },

    /// Comments on a document.
    ListComments {
        /// Document ID.
        document_id: DocumentId,
    },
    /// Add a comment.
    AddComment {
        /// Document ID.
        document_id: DocumentId,
        /// Comment body.
        text: String,
    },
    /// Edit a comment.
    EditComment {
        /// Document ID.
        document_id: DocumentId,
        /// Comment ID.
        comment_id: CommentId,
        /// New body.
        text: String,
    },
    /// Delete a comment.
    DeleteComment {
        /// Document ID.
        document_id: DocumentId,
        /// Comment ID.
        comment_id: CommentId,
    },

    /// Grant access to a document.
    ShareDocument {
        /// Document ID.
        document_id: DocumentId,
        /// Grantee and level.
        #[serde(flatten)]
        request: ShareRequest,
    },
    /// Revoke access to a document.
    RevokeDocument {
        /// Document ID.
        document_id: DocumentId,
        /// The grantee.
        #[serde(flatten)]
        grantee: Grantee,
    },
    /// Grants on a document.
    DocumentPermissions {
        /// Document ID.
        document_id: DocumentId,
    },
    /// Grant access to a folder.
    ShareFolder {
        /// Folder ID.
        folder_id: FolderId,
        /// Grantee and level.
        #[serde(flatten)]
        request: ShareRequest,
    },
    /// Revoke access to a folder.
    RevokeFolder {
        /// Folder ID.
        folder_id: FolderId,
        /// The grantee.
        #[serde(flatten)]
        grantee: Grantee,
    },
    /// Grants on a folder.
    FolderPermissions {
        /// Folder ID.
        folder_id: FolderId,
    },

    /// Create a folder.
    CreateFolder(CreateFolderRequest),
    /// The actor's folders under a parent, or at the root.
    ListFolders {
        /// Parent folder.
        #[serde(default)]
        parent_id: Option<FolderId>,
    },
    /// A folder with its subfolders.
    GetFolder {
        /// Folder ID.
        folder_id: FolderId,
    },
    /// Documents and subfolders of a folder.
    FolderContents {
        /// Folder ID.
        folder_id: FolderId,
    },
    /// Rename or move a folder.
    UpdateFolder {
        /// Folder ID.
        folder_id: FolderId,
        /// Changes.
        #[serde(flatten)]
        changes: UpdateFolderRequest,
    },
    /// Trash a folder and everything below it.
    TrashFolder {
        /// Folder ID.
        folder_id: FolderId,
    },

    /// Append an activity entry.
    RecordActivity {
        /// Document ID.
        document_id: DocumentId,
        /// Action name.
        action: String,
        /// Free-form details.
        #[serde(default)]
        details: serde_json::Value,
    },
    /// A document's activity log.
    DocumentActivity {
        /// Document ID.
        document_id: DocumentId,
    },
    /// Activity across the actor's documents.
    UserActivity,
    /// Totals over the actor's documents.
    Statistics,
    /// Favorite flag derived from the activity log.
    FavoriteState {
        /// Document ID.
        document_id: DocumentId,
    },

    /// The actor's notifications.
    ListNotifications {
        /// Only unread ones.
        #[serde(default)]
        unread_only: bool,
        /// Maximum returned.
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Unread notification count.
    UnreadCount,
    /// Mark notifications read; all of them when `ids` is unset.
    MarkNotificationsRead {
        /// Notifications to mark.
        #[serde(default)]
        ids: Option<Vec<NotificationId>>,
    },

    /// Search document metadata.
    Search(SearchQuery),
    /// Tag usage counts.
    ListTags,
}

impl Operation {
    /// The `op` tag, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterUser(_) => "register_user",
            Self::GetUser { .. } => "get_user",
            Self::ListUsers => "list_users",
            Self::IssueResetToken { .. } => "issue_reset_token",
            Self::RedeemResetToken { .. } => "redeem_reset_token",
            Self::UploadDocument { .. } => "upload_document",
            Self::GetDocument { .. } => "get_document",
            Self::UpdateDocument { .. } => "update_document",
            Self::DownloadDocument { .. } => "download_document",
            Self::ListDocuments(_) => "list_documents",
            Self::ListShared => "list_shared",
            Self::ListRecent => "list_recent",
            Self::TrashDocument { .. } => "trash_document",
            Self::RestoreDocument { .. } => "restore_document",
            Self::ListTrash => "list_trash",
            Self::EmptyTrash => "empty_trash",
            Self::ToggleFavorite { .. } => "toggle_favorite",
            Self::ListFavorites => "list_favorites",
            Self::AddVersion { .. } => "add_version",
            Self::RestoreVersion { .. } => "restore_version",
            Self::ListVersions { .. } => "list_versions",
            Self::ReadVersion { .. } => "read_version",
            Self::ListComments { .. } => "list_comments",
            Self::AddComment { .. } => "add_comment",
            Self::EditComment { .. } => "edit_comment",
            Self::DeleteComment { .. } => "delete_comment",
            Self::ShareDocument { .. } => "share_document",
            Self::RevokeDocument { .. } => "revoke_document",
            Self::DocumentPermissions { .. } => "document_permissions",
            Self::ShareFolder { .. } => "share_folder",
            Self::RevokeFolder { .. } => "revoke_folder",
            Self::FolderPermissions { .. } => "folder_permissions",
            Self::CreateFolder(_) => "create_folder",
            Self::ListFolders { .. } => "list_folders",
            Self::GetFolder { .. } => "get_folder",
            Self::FolderContents { .. } => "folder_contents",
            Self::UpdateFolder { .. } => "update_folder",
            Self::TrashFolder { .. } => "trash_folder",
            Self::RecordActivity { .. } => "record_activity",
            Self::DocumentActivity { .. } => "document_activity",
            Self::UserActivity => "user_activity",
            Self::Statistics => "statistics",
            Self::FavoriteState { .. } => "favorite_state",
            Self::ListNotifications { .. } => "list_notifications",
            Self::UnreadCount => "unread_count",
            Self::MarkNotificationsRead { .. } => "mark_notifications_read",
            Self::Search(_) => "search",
            Self::ListTags => "list_tags",
        }
    }
}
