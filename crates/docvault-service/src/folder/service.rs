//! Folder CRUD, contents and cascading trash.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use docvault_auth::acl;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::{FolderId, UserId};
use docvault_database::repositories::{
    DocumentFilter, DocumentRepository, DocumentSort, DocumentSortField, DocumentUpdate,
    FolderFilter, FolderRepository, FolderUpdate,
};
use docvault_entity::document::Document;
use docvault_entity::folder::{CreateFolder, Folder};
use docvault_entity::permission::AccessLevel;

use crate::context::RequestContext;
use crate::request;

const DUPLICATE_NAME: &str = "A folder with the same name already exists in this location.";

/// Request to create a folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name; surrounding whitespace is dropped.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Parent folder; the folder is created at the root when unset.
    #[serde(default)]
    pub parent_id: Option<FolderId>,
}

/// Request to rename or move a folder. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFolderRequest {
    /// New name.
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New parent.
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    /// Move to the root. Ignored when `parent_id` is set.
    #[serde(default)]
    pub move_to_root: bool,
}

/// A folder with its non-trashed subfolders.
#[derive(Debug, Clone, Serialize)]
pub struct FolderDetail {
    /// The folder.
    #[serde(flatten)]
    pub folder: Folder,
    /// Direct subfolders, by name.
    pub subfolders: Vec<Folder>,
}

/// What a folder directly contains.
#[derive(Debug, Clone, Serialize)]
pub struct FolderContents {
    /// The folder.
    pub folder: Folder,
    /// Documents, by title.
    pub files: Vec<Document>,
    /// Subfolders, by name.
    pub subfolders: Vec<Folder>,
}

/// Outcome of a cascading folder trash.
#[derive(Debug, Clone, Serialize)]
pub struct FolderTrashSummary {
    /// Folders trashed, the target included.
    pub folders: usize,
    /// Documents trashed.
    pub documents: usize,
    /// Instant stamped on every trashed node.
    pub trashed_at: DateTime<Utc>,
}

/// Manages the folder tree.
#[derive(Debug, Clone)]
pub struct FolderService {
    folder_repo: Arc<FolderRepository>,
    doc_repo: Arc<DocumentRepository>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(folder_repo: Arc<FolderRepository>, doc_repo: Arc<DocumentRepository>) -> Self {
        Self {
            folder_repo,
            doc_repo,
        }
    }

    /// Creates a folder owned by the actor.
    ///
    /// The parent must be owned by the actor or granted to them at admin
    /// level. Names are unique per owner and parent among live folders.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let name = request::required(&req.name, "Folder name")?;
        request::validate(&req)?;
        if let Some(parent_id) = req.parent_id {
            self.require_parent(ctx, parent_id).await?;
        }
        self.ensure_unique(ctx.user_id, req.parent_id, &name, None)
            .await?;

        let folder = Folder::create(CreateFolder {
            name,
            owner_id: ctx.user_id,
            parent_id: req.parent_id,
        });
        self.folder_repo.insert_one(&folder).await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );
        Ok(folder)
    }

    /// The actor's live folders directly under `parent_id` (root when
    /// unset), by name.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        parent_id: Option<FolderId>,
    ) -> AppResult<Vec<Folder>> {
        self.folder_repo
            .find(
                &FolderFilter::default()
                    .owned_by(ctx.user_id)
                    .under(parent_id)
                    .trashed(false),
            )
            .await
    }

    /// A folder and its live subfolders.
    pub async fn get(&self, ctx: &RequestContext, id: FolderId) -> AppResult<FolderDetail> {
        let folder = self.find_live(id).await?;
        acl::require(ctx.user_id, &folder, AccessLevel::View)?;
        let subfolders = self.children(id).await?;
        Ok(FolderDetail { folder, subfolders })
    }

    /// Documents and subfolders directly inside a folder.
    pub async fn contents(&self, ctx: &RequestContext, id: FolderId) -> AppResult<FolderContents> {
        let folder = self.find_live(id).await?;
        acl::require(ctx.user_id, &folder, AccessLevel::View)?;

        let files = self
            .doc_repo
            .find(
                &DocumentFilter::default().in_folder(Some(id)).trashed(false),
                DocumentSort::asc(DocumentSortField::Title),
            )
            .await?;
        let subfolders = self.children(id).await?;
        Ok(FolderContents {
            folder,
            files,
            subfolders,
        })
    }

    /// Renames and/or moves a folder. Moving a folder under itself or
    /// under one of its descendants is a conflict.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: FolderId,
        req: UpdateFolderRequest,
    ) -> AppResult<Folder> {
        request::validate(&req)?;
        let folder = self.find_live(id).await?;
        acl::require(ctx.user_id, &folder, AccessLevel::Edit)?;

        let mut update = FolderUpdate::new();
        let mut changed = false;

        let target_parent = match (req.parent_id, req.move_to_root) {
            (Some(parent_id), _) => Some(Some(parent_id)),
            (None, true) => Some(None),
            (None, false) => None,
        };
        let parent_after = target_parent.unwrap_or(folder.parent_id);

        if let Some(Some(parent_id)) = target_parent {
            if parent_id == id {
                return Err(AppError::conflict("A folder cannot be its own parent."));
            }
            self.require_parent(ctx, parent_id).await?;
            let ancestry = self.folder_repo.ancestors(parent_id).await?;
            if ancestry.iter().any(|f| f.id == id) {
                return Err(AppError::conflict(
                    "Cannot create circular folder structure.",
                ));
            }
        }
        if let Some(parent) = target_parent {
            if parent != folder.parent_id {
                update = update.set_parent(parent);
                changed = true;
            }
        }

        let name_after = match req.name {
            Some(name) => {
                let name = request::required(&name, "Folder name")?;
                if name != folder.name {
                    update = update.set_name(name.clone());
                    changed = true;
                }
                name
            }
            None => folder.name.clone(),
        };

        if !changed {
            return Ok(folder);
        }
        self.ensure_unique(folder.owner_id, parent_after, &name_after, Some(id))
            .await?;

        let updated = self
            .folder_repo
            .update_one(&FolderFilter::by_id(id).trashed(false), update)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %id,
            name = %updated.name,
            "Folder updated"
        );
        Ok(updated)
    }

    /// Trashes a folder, its documents and its whole subtree.
    ///
    /// The owner or an admin grantee may do this. Each folder's direct
    /// documents are trashed before the folder, and subfolders are visited
    /// pre-order by name. Every node gets the same `trashed_at`. Nodes are
    /// updated one by one, so a failure part-way leaves the earlier nodes
    /// trashed.
    pub async fn trash(&self, ctx: &RequestContext, id: FolderId) -> AppResult<FolderTrashSummary> {
        let folder = self.find_live(id).await?;
        acl::require_owner_or_admin(ctx.user_id, &folder)?;

        let now = Utc::now();
        let mut summary = FolderTrashSummary {
            folders: 0,
            documents: 0,
            trashed_at: now,
        };
        let mut stack: Vec<FolderId> = vec![id];
        let mut visited: HashSet<FolderId> = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                warn!(folder_id = %current, "Folder visited twice during trash, skipping");
                continue;
            }

            let docs = self
                .doc_repo
                .find(
                    &DocumentFilter::default()
                        .in_folder(Some(current))
                        .trashed(false),
                    DocumentSort::asc(DocumentSortField::Title),
                )
                .await?;
            for doc in docs {
                let trashed = self
                    .doc_repo
                    .update_one(
                        &DocumentFilter::by_id(doc.id).trashed(false),
                        DocumentUpdate::new().trash(now),
                    )
                    .await?;
                if trashed.is_some() {
                    summary.documents += 1;
                }
            }

            let trashed = self
                .folder_repo
                .update_one(
                    &FolderFilter::by_id(current).trashed(false),
                    FolderUpdate::new().trash(now),
                )
                .await?;
            if trashed.is_some() {
                summary.folders += 1;
            }

            let children = self.children(current).await?;
            stack.extend(children.into_iter().rev().map(|f| f.id));
        }

        info!(
            user_id = %ctx.user_id,
            folder_id = %id,
            folders = summary.folders,
            documents = summary.documents,
            "Folder and contents moved to trash"
        );
        Ok(summary)
    }

    async fn find_live(&self, id: FolderId) -> AppResult<Folder> {
        self.folder_repo
            .find_one(&FolderFilter::by_id(id).trashed(false))
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    async fn children(&self, id: FolderId) -> AppResult<Vec<Folder>> {
        self.folder_repo
            .find(&FolderFilter::default().under(Some(id)).trashed(false))
            .await
    }

    /// A prospective parent must be live and owned by, or admin-granted
    /// to, the actor. Anything else reads as absent.
    async fn require_parent(&self, ctx: &RequestContext, parent_id: FolderId) -> AppResult<Folder> {
        let parent = self
            .folder_repo
            .find_one(&FolderFilter::by_id(parent_id).trashed(false))
            .await?
            .filter(|p| acl::authorize(ctx.user_id, p, AccessLevel::Admin))
            .ok_or_else(|| {
                AppError::not_found("Parent folder not found or permission denied.")
            })?;
        Ok(parent)
    }

    async fn ensure_unique(
        &self,
        owner_id: UserId,
        parent_id: Option<FolderId>,
        name: &str,
        except: Option<FolderId>,
    ) -> AppResult<()> {
        let clashes = self
            .folder_repo
            .find(
                &FolderFilter::default()
                    .owned_by(owner_id)
                    .under(parent_id)
                    .named(name)
                    .trashed(false),
            )
            .await?;
        if clashes.iter().any(|f| Some(f.id) != except) {
            return Err(AppError::conflict(DUPLICATE_NAME));
        }
        Ok(())
    }
}
