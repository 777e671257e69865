//! Notification delivery and inbox management.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use docvault_core::config::notification::NotificationConfig;
use docvault_core::result::AppResult;
use docvault_core::traits::Notifier;
use docvault_core::types::Notice;
use docvault_core::types::id::NotificationId;
use docvault_database::repositories::NotificationRepository;
use docvault_entity::notification::Notification;

use crate::context::RequestContext;

/// Stores notices as notifications and serves each user's inbox.
#[derive(Debug, Clone)]
pub struct NotificationService {
    notif_repo: Arc<NotificationRepository>,
    default_limit: usize,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(notif_repo: Arc<NotificationRepository>, config: &NotificationConfig) -> Self {
        Self {
            notif_repo,
            default_limit: config.default_list_limit,
        }
    }

    /// Lists the actor's notifications, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        unread_only: bool,
        limit: Option<usize>,
    ) -> AppResult<Vec<Notification>> {
        self.notif_repo
            .find_by_user(
                ctx.user_id,
                unread_only,
                limit.unwrap_or(self.default_limit),
            )
            .await
    }

    /// Counts the actor's unread notifications.
    pub async fn unread_count(&self, ctx: &RequestContext) -> AppResult<usize> {
        self.notif_repo.count_unread(ctx.user_id).await
    }

    /// Marks the listed notifications, or all of them, as read.
    ///
    /// Only the actor's own unread notifications change; the count of
    /// changed records is returned.
    pub async fn mark_read(
        &self,
        ctx: &RequestContext,
        ids: Option<&[NotificationId]>,
    ) -> AppResult<usize> {
        let changed = self.notif_repo.mark_read(ctx.user_id, ids).await?;
        info!(user_id = %ctx.user_id, changed, "Notifications marked read");
        Ok(changed)
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn notify(&self, notice: Notice) -> AppResult<()> {
        let notification = Notification::from_notice(notice);
        self.notif_repo.insert_one(&notification).await?;
        info!(
            recipient = %notification.user_id,
            kind = %notification.kind,
            notification_id = %notification.id,
            "Notification created"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::types::NoticeKind;
    use docvault_core::types::id::UserId;
    use docvault_database::Database;

    fn service() -> NotificationService {
        NotificationService::new(
            Arc::new(NotificationRepository::new(Database::in_memory())),
            &NotificationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_notify_then_mark_all_read() {
        let notifications = service();
        let user = UserId::new();
        let ctx = RequestContext::new(user);
        for i in 0..3 {
            notifications
                .notify(Notice::new(user, NoticeKind::System, format!("n{i}")))
                .await
                .unwrap();
        }
        notifications
            .notify(Notice::new(UserId::new(), NoticeKind::System, "other"))
            .await
            .unwrap();

        assert_eq!(notifications.unread_count(&ctx).await.unwrap(), 3);
        assert_eq!(notifications.mark_read(&ctx, None).await.unwrap(), 3);
        assert_eq!(notifications.mark_read(&ctx, None).await.unwrap(), 0);
        let unread = notifications.list(&ctx, true, None).await.unwrap();
        assert!(unread.is_empty());
        let page = notifications.list(&ctx, false, Some(2)).await.unwrap();
        assert_eq!(page.len(), 2);
    }
}
