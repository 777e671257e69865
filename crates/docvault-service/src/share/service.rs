//! Sharing: granting, revoking and listing per-user access.
//!
//! Documents and folders follow the same rules. Only the owner grants. The
//! owner or an admin grantee revokes and lists. Document grants also land
//! in the document's activity log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use docvault_auth::acl;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::Notifier;
use docvault_core::types::id::{DocumentId, FolderId, UserId};
use docvault_database::repositories::{
    DocumentRepository, DocumentUpdate, FolderFilter, FolderRepository, FolderUpdate,
};
use docvault_entity::document::{Activity, ActivityAction};
use docvault_entity::folder::Folder;
use docvault_entity::permission::{AccessControlled, AccessLevel, PermissionEntry};
use docvault_entity::user::User;

use crate::context::RequestContext;
use crate::document::{find_active, update_active};
use crate::notification::{NotificationRules, deliver};
use crate::user::{UserService, UserSummary};

/// Identifies a grantee by ID or by email. Exactly one must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grantee {
    /// Grantee user ID.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Grantee email.
    #[serde(default)]
    pub email: Option<String>,
}

impl Grantee {
    /// A grantee named by ID.
    pub fn id(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            email: None,
        }
    }

    /// A grantee named by email.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            user_id: None,
            email: Some(email.into()),
        }
    }
}

/// A grant request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Who receives access.
    #[serde(flatten)]
    pub grantee: Grantee,
    /// Level granted.
    pub access_level: AccessLevel,
}

/// A grant resolved to the grantee's identity.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionView {
    /// Grantee ID.
    pub user_id: UserId,
    /// Grantee email.
    pub email: String,
    /// Grantee display name.
    pub name: String,
    /// Granted level.
    pub access_level: AccessLevel,
    /// When the grant was made or last replaced.
    pub granted_at: DateTime<Utc>,
    /// Who made the grant.
    pub granted_by: UserId,
}

/// Owner and grants of a resource.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionList {
    /// The owner, when the account still exists.
    pub owner: Option<UserSummary>,
    /// Grants whose grantee still exists, in grant order.
    pub permissions: Vec<PermissionView>,
}

/// Manages grants on documents and folders.
#[derive(Clone)]
pub struct ShareService {
    doc_repo: Arc<DocumentRepository>,
    folder_repo: Arc<FolderRepository>,
    users: Arc<UserService>,
    notifier: Arc<dyn Notifier>,
    rules: NotificationRules,
}

impl std::fmt::Debug for ShareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareService").finish_non_exhaustive()
    }
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        doc_repo: Arc<DocumentRepository>,
        folder_repo: Arc<FolderRepository>,
        users: Arc<UserService>,
        notifier: Arc<dyn Notifier>,
        rules: NotificationRules,
    ) -> Self {
        Self {
            doc_repo,
            folder_repo,
            users,
            notifier,
            rules,
        }
    }

    /// Grants `req.access_level` on a document. A repeated grant replaces
    /// the level in place.
    pub async fn share_document(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        req: ShareRequest,
    ) -> AppResult<PermissionEntry> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require_owner(ctx.user_id, &doc)?;
        let grantee = self.resolve_grantee(ctx, &req.grantee).await?;

        let entry = self.entry(ctx, grantee.id, req.access_level);
        let updated = update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .upsert_permission(entry)
                .push_activity(Activity::new(
                    ctx.user_id,
                    ActivityAction::Share,
                    json!({
                        "shared_with": grantee.email,
                        "access_level": req.access_level,
                    }),
                )),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            grantee_id = %grantee.id,
            access_level = %req.access_level,
            "Document shared"
        );

        let actor_name = self.users.display_name(ctx.user_id).await?;
        deliver(
            self.notifier.as_ref(),
            self.rules.document_shared(
                ctx.user_id,
                &actor_name,
                &updated,
                grantee.id,
                req.access_level,
            ),
        )
        .await;
        granted(&updated, grantee.id)
    }

    /// Removes a grantee's access to a document.
    pub async fn revoke_document(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
        grantee: Grantee,
    ) -> AppResult<()> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require_owner_or_admin(ctx.user_id, &doc)?;
        let (grantee_id, email) = self.revokee(&grantee).await?;
        ensure_granted(&doc, grantee_id)?;

        update_active(
            &self.doc_repo,
            id,
            DocumentUpdate::new()
                .pull_permission(grantee_id)
                .push_activity(Activity::new(
                    ctx.user_id,
                    ActivityAction::Unshare,
                    json!({ "email": email }),
                )),
        )
        .await?;

        info!(
            user_id = %ctx.user_id,
            document_id = %id,
            grantee_id = %grantee_id,
            "Document access revoked"
        );
        Ok(())
    }

    /// Owner and grants of a document.
    pub async fn document_permissions(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<PermissionList> {
        let doc = find_active(&self.doc_repo, id).await?;
        acl::require_owner_or_admin(ctx.user_id, &doc)?;
        self.permission_list(&doc).await
    }

    /// Grants `req.access_level` on a folder.
    pub async fn share_folder(
        &self,
        ctx: &RequestContext,
        id: FolderId,
        req: ShareRequest,
    ) -> AppResult<PermissionEntry> {
        let folder = self.find_folder(id).await?;
        acl::require_owner(ctx.user_id, &folder)?;
        let grantee = self.resolve_grantee(ctx, &req.grantee).await?;

        let updated = self
            .update_folder(
                id,
                FolderUpdate::new().upsert_permission(self.entry(
                    ctx,
                    grantee.id,
                    req.access_level,
                )),
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %id,
            grantee_id = %grantee.id,
            access_level = %req.access_level,
            "Folder shared"
        );

        let actor_name = self.users.display_name(ctx.user_id).await?;
        deliver(
            self.notifier.as_ref(),
            self.rules.folder_shared(
                ctx.user_id,
                &actor_name,
                &updated,
                grantee.id,
                req.access_level,
            ),
        )
        .await;
        granted(&updated, grantee.id)
    }

    /// Removes a grantee's access to a folder.
    pub async fn revoke_folder(
        &self,
        ctx: &RequestContext,
        id: FolderId,
        grantee: Grantee,
    ) -> AppResult<()> {
        let folder = self.find_folder(id).await?;
        acl::require_owner_or_admin(ctx.user_id, &folder)?;
        let (grantee_id, _) = self.revokee(&grantee).await?;
        ensure_granted(&folder, grantee_id)?;

        self.update_folder(id, FolderUpdate::new().pull_permission(grantee_id))
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %id,
            grantee_id = %grantee_id,
            "Folder access revoked"
        );
        Ok(())
    }

    /// Owner and grants of a folder.
    pub async fn folder_permissions(
        &self,
        ctx: &RequestContext,
        id: FolderId,
    ) -> AppResult<PermissionList> {
        let folder = self.find_folder(id).await?;
        acl::require_owner_or_admin(ctx.user_id, &folder)?;
        self.permission_list(&folder).await
    }

    fn entry(&self, ctx: &RequestContext, grantee: UserId, level: AccessLevel) -> PermissionEntry {
        PermissionEntry {
            user_id: grantee,
            access_level: level,
            granted_at: Utc::now(),
            granted_by: ctx.user_id,
        }
    }

    async fn lookup(&self, grantee: &Grantee) -> AppResult<Option<User>> {
        match (grantee.user_id, grantee.email.as_deref()) {
            (Some(id), None) => self.users.resolve([id]).await.map(|mut m| m.remove(&id)),
            (None, Some(email)) => match self.users.get_by_email(email.trim()).await {
                Ok(user) => Ok(Some(user)),
                Err(e) if e.kind == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            },
            _ => Err(AppError::validation(
                "Exactly one of user_id or email is required",
            )),
        }
    }

    async fn resolve_grantee(&self, ctx: &RequestContext, grantee: &Grantee) -> AppResult<User> {
        let user = self
            .lookup(grantee)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if user.id == ctx.user_id {
            return Err(AppError::conflict("Cannot share with yourself"));
        }
        Ok(user)
    }

    /// The grantee to revoke. A deleted account can still be revoked by ID.
    async fn revokee(&self, grantee: &Grantee) -> AppResult<(UserId, Option<String>)> {
        match self.lookup(grantee).await? {
            Some(user) => Ok((user.id, Some(user.email))),
            None => match grantee.user_id {
                Some(id) => Ok((id, None)),
                None => Err(AppError::not_found("User not found")),
            },
        }
    }

    async fn find_folder(&self, id: FolderId) -> AppResult<Folder> {
        self.folder_repo
            .find_one(&FolderFilter::by_id(id).trashed(false))
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    async fn update_folder(&self, id: FolderId, update: FolderUpdate) -> AppResult<Folder> {
        self.folder_repo
            .update_one(&FolderFilter::by_id(id).trashed(false), update)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    async fn permission_list<R: AccessControlled>(
        &self,
        resource: &R,
    ) -> AppResult<PermissionList> {
        let owner_id = resource.owner_id();
        let grantees = resource.permissions().iter().map(|p| p.user_id);
        let mut users = self
            .users
            .resolve(std::iter::once(owner_id).chain(grantees))
            .await?;

        let permissions = resource
            .permissions()
            .iter()
            .filter_map(|p| {
                users.get(&p.user_id).map(|u| PermissionView {
                    user_id: p.user_id,
                    email: u.email.clone(),
                    name: u.display_name(),
                    access_level: p.access_level,
                    granted_at: p.granted_at,
                    granted_by: p.granted_by,
                })
            })
            .collect();
        Ok(PermissionList {
            owner: users.remove(&owner_id).as_ref().map(UserSummary::from),
            permissions,
        })
    }
}

fn granted<R: AccessControlled>(resource: &R, grantee: UserId) -> AppResult<PermissionEntry> {
    resource
        .permission_for(grantee)
        .cloned()
        .ok_or_else(|| AppError::internal("Grant missing after update"))
}

fn ensure_granted<R: AccessControlled>(resource: &R, grantee: UserId) -> AppResult<()> {
    if resource.permission_for(grantee).is_none() {
        return Err(AppError::not_found("User does not have access"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UploadDocument;
    use crate::folder::CreateFolderRequest;
    use crate::services::Services;
    use bytes::Bytes;
    use docvault_core::types::NoticeKind;
    use docvault_entity::document::Document;
    use docvault_entity::user::CreateUser;

    async fn register(services: &Services, email: &str, first: &str) -> RequestContext {
        let user = services
            .users
            .register(CreateUser {
                email: email.into(),
                first_name: first.into(),
                last_name: String::new(),
            })
            .await
            .unwrap();
        RequestContext::new(user.id)
    }

    async fn setup() -> (Services, RequestContext, RequestContext, Document) {
        let services = Services::in_memory();
        let owner = register(&services, "olga@example.com", "Olga").await;
        let guest = register(&services, "ade@example.com", "Ade").await;
        let doc = services
            .documents
            .upload(
                &owner,
                UploadDocument {
                    filename: "brief.txt".into(),
                    title: Some("Brief".into()),
                    ..UploadDocument::default()
                },
                Bytes::from_static(b"brief"),
            )
            .await
            .unwrap();
        (services, owner, guest, doc)
    }

    fn share(grantee: Grantee, level: AccessLevel) -> ShareRequest {
        ShareRequest {
            grantee,
            access_level: level,
        }
    }

    #[tokio::test]
    async fn test_reshare_replaces_in_place() {
        let (services, owner, guest, doc) = setup().await;
        services
            .sharing
            .share_document(
                &owner,
                doc.id,
                share(Grantee::email("ade@example.com"), AccessLevel::View),
            )
            .await
            .unwrap();
        let entry = services
            .sharing
            .share_document(
                &owner,
                doc.id,
                share(Grantee::id(guest.user_id), AccessLevel::Edit),
            )
            .await
            .unwrap();
        assert_eq!(entry.access_level, AccessLevel::Edit);

        let list = services
            .sharing
            .document_permissions(&owner, doc.id)
            .await
            .unwrap();
        assert_eq!(list.permissions.len(), 1);
        assert_eq!(list.permissions[0].name, "Ade");
        assert_eq!(list.owner.unwrap().name, "Olga");

        let inbox = services
            .notifications
            .list(&guest, false, None)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|n| n.kind == NoticeKind::Share));
    }

    #[tokio::test]
    async fn test_self_share_conflicts() {
        let (services, owner, _guest, doc) = setup().await;
        let err = services
            .sharing
            .share_document(
                &owner,
                doc.id,
                share(Grantee::id(owner.user_id), AccessLevel::View),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let list = services
            .sharing
            .document_permissions(&owner, doc.id)
            .await
            .unwrap();
        assert!(list.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_grantee_and_non_owner() {
        let (services, owner, guest, doc) = setup().await;
        let err = services
            .sharing
            .share_document(
                &owner,
                doc.id,
                share(Grantee::id(UserId::new()), AccessLevel::View),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = services
            .sharing
            .share_document(
                &guest,
                doc.id,
                share(Grantee::id(owner.user_id), AccessLevel::View),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let err = services
            .sharing
            .share_document(&owner, doc.id, share(Grantee::default(), AccessLevel::View))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_revoke_missing_grant_leaves_list() {
        let (services, owner, guest, doc) = setup().await;
        let other = register(&services, "kai@example.com", "Kai").await;
        services
            .sharing
            .share_document(
                &owner,
                doc.id,
                share(Grantee::id(guest.user_id), AccessLevel::View),
            )
            .await
            .unwrap();

        let err = services
            .sharing
            .revoke_document(&owner, doc.id, Grantee::id(other.user_id))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let list = services
            .sharing
            .document_permissions(&owner, doc.id)
            .await
            .unwrap();
        assert_eq!(list.permissions.len(), 1);

        services
            .sharing
            .revoke_document(&owner, doc.id, Grantee::id(guest.user_id))
            .await
            .unwrap();
        let err = services.documents.get(&guest, doc.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let doc = services.documents.get(&owner, doc.id).await.unwrap();
        let actions: Vec<_> = doc.activities.iter().map(|a| a.action).collect();
        assert!(actions.contains(&ActivityAction::Share));
        assert!(actions.contains(&ActivityAction::Unshare));
    }

    #[tokio::test]
    async fn test_admin_grantee_can_revoke_and_list() {
        let (services, owner, guest, doc) = setup().await;
        let viewer = register(&services, "kai@example.com", "Kai").await;
        for (who, level) in [(&guest, AccessLevel::Admin), (&viewer, AccessLevel::View)] {
            services
                .sharing
                .share_document(&owner, doc.id, share(Grantee::id(who.user_id), level))
                .await
                .unwrap();
        }

        let err = services
            .sharing
            .document_permissions(&viewer, doc.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        services
            .sharing
            .revoke_document(&guest, doc.id, Grantee::email("kai@example.com"))
            .await
            .unwrap();
        let list = services
            .sharing
            .document_permissions(&guest, doc.id)
            .await
            .unwrap();
        assert_eq!(list.permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_folder_share_grants_view() {
        let (services, owner, guest, _doc) = setup().await;
        let folder = services
            .folders
            .create(
                &owner,
                CreateFolderRequest {
                    name: "Shared".into(),
                    parent_id: None,
                },
            )
            .await
            .unwrap();

        let err = services.folders.get(&guest, folder.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        services
            .sharing
            .share_folder(
                &owner,
                folder.id,
                share(Grantee::id(guest.user_id), AccessLevel::View),
            )
            .await
            .unwrap();
        services.folders.get(&guest, folder.id).await.unwrap();

        let inbox = services
            .notifications
            .list(&guest, false, None)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].details["folder_id"], json!(folder.id));

        services
            .sharing
            .revoke_folder(&owner, folder.id, Grantee::id(guest.user_id))
            .await
            .unwrap();
        let list = services
            .sharing
            .folder_permissions(&owner, folder.id)
            .await
            .unwrap();
        assert!(list.permissions.is_empty());
    }
}
