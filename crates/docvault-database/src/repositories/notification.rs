//! Notification repository implementation.

use chrono::Utc;

use docvault_core::result::AppResult;
use docvault_core::types::id::{NotificationId, UserId};
use docvault_entity::notification::Notification;

use crate::connection::Database;

/// Repository for notification records.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: Database,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a notification.
    pub async fn insert_one(&self, notification: &Notification) -> AppResult<()> {
        self.db
            .collections()
            .notifications
            .insert_one(notification.id, notification.clone())
    }

    /// Notifications of `user_id`, newest first, at most `limit`.
    pub async fn find_by_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: usize,
    ) -> AppResult<Vec<Notification>> {
        let mut found = self
            .db
            .collections()
            .notifications
            .find(|n| n.user_id == user_id && (!unread_only || n.is_unread()));
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(limit);
        Ok(found)
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: UserId) -> AppResult<usize> {
        Ok(self
            .db
            .collections()
            .notifications
            .keys_where(|n| n.user_id == user_id && n.is_unread())
            .len())
    }

    /// Mark the recipient's unread notifications as read: the listed ones,
    /// or all of them when `ids` is `None`. Returns how many changed.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        ids: Option<&[NotificationId]>,
    ) -> AppResult<usize> {
        let notifications = &self.db.collections().notifications;
        let selected = |n: &Notification| {
            n.user_id == user_id && n.is_unread() && ids.is_none_or(|ids| ids.contains(&n.id))
        };
        let now = Utc::now();
        let mut changed = 0;
        for key in notifications.keys_where(selected) {
            let updated = notifications.update_one(&key, selected, |n| {
                n.is_read = true;
                n.read_at = Some(now);
                Ok(())
            })?;
            if updated.is_some() {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::types::{Notice, NoticeKind};

    #[tokio::test]
    async fn test_mark_read_only_touches_recipient_unread() {
        let repo = NotificationRepository::new(Database::in_memory());
        let alice = UserId::new();
        let bob = UserId::new();
        let mut ids = Vec::new();
        for recipient in [alice, alice, bob] {
            let n = Notification::from_notice(Notice::new(recipient, NoticeKind::System, "hi"));
            ids.push(n.id);
            repo.insert_one(&n).await.unwrap();
        }

        let changed = repo
            .mark_read(alice, Some(&[ids[0], ids[2]][..]))
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(repo.count_unread(alice).await.unwrap(), 1);
        assert_eq!(repo.count_unread(bob).await.unwrap(), 1);

        assert_eq!(repo.mark_read(alice, None).await.unwrap(), 1);
        assert_eq!(repo.mark_read(alice, None).await.unwrap(), 0);
        assert_eq!(repo.find_by_user(alice, true, 50).await.unwrap().len(), 0);
        assert_eq!(repo.find_by_user(alice, false, 50).await.unwrap().len(), 2);
    }
}
