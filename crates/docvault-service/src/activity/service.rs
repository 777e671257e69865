//! Per-document activity log reads and appends.
//!
//! Feeds fan out over every accessible document and every entry in it,
//! so their cost grows with documents times activities.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;

use docvault_auth::acl;
use docvault_core::config::activity::ActivityConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::{DocumentId, UserId};
use docvault_database::repositories::{
    DocumentFilter, DocumentRepository, DocumentSort, DocumentUpdate,
};
use docvault_entity::document::{Activity, ActivityAction, Document};
use docvault_entity::permission::AccessLevel;

use crate::context::RequestContext;
use crate::document::find_active;
use crate::user::UserService;

/// Favorite flag of `user_id` on `doc` derived from the activity log: the
/// latest favorite or unfavorite entry by that user decides.
pub fn favorite_state(doc: &Document, user_id: UserId) -> bool {
    doc.latest_favorite_event(user_id)
        .is_some_and(|a| a.action == ActivityAction::Favorite)
}

/// An activity entry annotated for display.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    /// The entry.
    #[serde(flatten)]
    pub activity: Activity,
    /// Display name of the acting user.
    pub user_name: String,
    /// Document the entry belongs to, in cross-document feeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<DocumentId>,
    /// Title of that document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_title: Option<String>,
}

/// Storage and activity summary of the actor's own documents.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    /// Number of non-trashed documents.
    pub total_files: usize,
    /// Their combined active size in bytes.
    pub total_size: u64,
    /// Document count per kind.
    pub files_by_type: BTreeMap<String, usize>,
    /// Bytes per kind.
    pub storage_by_type: BTreeMap<String, u64>,
    /// Latest entries within the statistics window, newest first.
    pub recent_activity: Vec<ActivityEntry>,
}

/// Appends to and reads from document activity logs.
#[derive(Debug, Clone)]
pub struct ActivityService {
    doc_repo: Arc<DocumentRepository>,
    users: Arc<UserService>,
    user_feed_limit: usize,
    statistics_limit: usize,
    statistics_window: Duration,
}

impl ActivityService {
    /// Creates a new activity service.
    pub fn new(
        doc_repo: Arc<DocumentRepository>,
        users: Arc<UserService>,
        config: &ActivityConfig,
    ) -> Self {
        Self {
            doc_repo,
            users,
            user_feed_limit: config.user_feed_limit,
            statistics_limit: config.statistics_limit,
            statistics_window: Duration::days(config.statistics_window_days),
        }
    }

    /// Appends one entry to a document's log, whatever its trash state.
    pub async fn append(
        &self,
        document_id: DocumentId,
        user_id: UserId,
        action: ActivityAction,
        details: serde_json::Value,
    ) -> AppResult<Activity> {
        let activity = Activity::new(user_id, action, details);
        self.doc_repo
            .update_one(
                &DocumentFilter::by_id(document_id),
                DocumentUpdate::new().push_activity(activity.clone()),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))?;
        Ok(activity)
    }

    /// Appends a `view` or `download` entry on behalf of the actor, who must
    /// be able to view the document. Every other action is written only by
    /// the operation it describes.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        action: &str,
        details: serde_json::Value,
    ) -> AppResult<Activity> {
        let action: ActivityAction = action.trim().to_lowercase().parse()?;
        if !action.is_read_only() {
            return Err(AppError::validation(format!(
                "Activity '{action}' cannot be recorded directly"
            )));
        }
        let doc = find_active(&self.doc_repo, document_id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let activity = self
            .append(document_id, ctx.user_id, action, details)
            .await?;
        info!(
            user_id = %ctx.user_id,
            document_id = %document_id,
            action = %action,
            "Activity recorded"
        );
        Ok(activity)
    }

    /// A document's log, newest first.
    pub async fn document_activity(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
    ) -> AppResult<Vec<ActivityEntry>> {
        let doc = find_active(&self.doc_repo, document_id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;

        let mut activities = doc.activities;
        activities.reverse();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.annotate(activities.into_iter().map(|a| (a, None)))
            .await
    }

    /// Merged log of every document the actor owns or is granted on,
    /// trashed ones included, newest first.
    pub async fn user_activity(&self, ctx: &RequestContext) -> AppResult<Vec<ActivityEntry>> {
        let docs = self
            .doc_repo
            .find(
                &DocumentFilter::default().accessible_to(ctx.user_id),
                DocumentSort::default(),
            )
            .await?;
        let merged = merge_feeds(&docs, |_| true, self.user_feed_limit);
        self.annotate(merged.into_iter().map(|(a, d)| (a, Some(d))))
            .await
    }

    /// Totals over the actor's non-trashed documents plus their recent
    /// activity.
    pub async fn statistics(&self, ctx: &RequestContext) -> AppResult<Statistics> {
        let docs = self
            .doc_repo
            .find(
                &DocumentFilter::default()
                    .owned_by(ctx.user_id)
                    .trashed(false),
                DocumentSort::default(),
            )
            .await?;

        let mut files_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut storage_by_type: BTreeMap<String, u64> = BTreeMap::new();
        for doc in &docs {
            *files_by_type.entry(doc.kind.to_string()).or_default() += 1;
            *storage_by_type.entry(doc.kind.to_string()).or_default() += doc.size;
        }

        let since = Utc::now() - self.statistics_window;
        let recent = merge_feeds(&docs, |a| a.timestamp >= since, self.statistics_limit);
        let recent_activity = self
            .annotate(recent.into_iter().map(|(a, d)| (a, Some(d))))
            .await?;

        Ok(Statistics {
            total_files: docs.len(),
            total_size: docs.iter().map(|d| d.size).sum(),
            files_by_type,
            storage_by_type,
            recent_activity,
        })
    }

    /// The actor's favorite state on a document, derived from the log.
    pub async fn favorite_state(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
    ) -> AppResult<bool> {
        let doc = find_active(&self.doc_repo, document_id).await?;
        acl::require(ctx.user_id, &doc, AccessLevel::View)?;
        Ok(favorite_state(&doc, ctx.user_id))
    }

    async fn annotate(
        &self,
        entries: impl Iterator<Item = (Activity, Option<(DocumentId, String)>)>,
    ) -> AppResult<Vec<ActivityEntry>> {
        let entries: Vec<_> = entries.collect();
        let names = self
            .users
            .display_names(entries.iter().map(|(a, _)| a.user_id))
            .await?;
        Ok(entries
            .into_iter()
            .map(|(activity, file)| {
                let user_name = names
                    .get(&activity.user_id)
                    .cloned()
                    .unwrap_or_else(|| crate::user::UNKNOWN_USER.to_string());
                let (file_id, file_title) = match file {
                    Some((id, title)) => (Some(id), Some(title)),
                    None => (None, None),
                };
                ActivityEntry {
                    activity,
                    user_name,
                    file_id,
                    file_title,
                }
            })
            .collect())
    }
}

/// Entries of every document passing `keep`, newest first, at most
/// `limit`, each paired with its document's id and title. Within one
/// document, equal timestamps keep the later entry first.
fn merge_feeds(
    docs: &[Document],
    keep: impl Fn(&Activity) -> bool,
    limit: usize,
) -> Vec<(Activity, (DocumentId, String))> {
    let mut merged: Vec<(Activity, (DocumentId, String))> = docs
        .iter()
        .flat_map(|doc| {
            doc.activities
                .iter()
                .rev()
                .filter(|a| keep(a))
                .map(move |a| (a.clone(), (doc.id, doc.title.clone())))
        })
        .collect();
    merged.sort_by(|a, b| b.0.timestamp.cmp(&a.0.timestamp));
    merged.truncate(limit);
    merged
}
