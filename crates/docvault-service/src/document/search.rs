//! Metadata search and tag counts over accessible documents.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use docvault_core::config::SearchConfig;
use docvault_core::result::AppResult;
use docvault_database::repositories::{
    DocumentFilter, DocumentRepository, DocumentSort, DocumentSortField,
};
use docvault_entity::document::{Document, DocumentKind};

use crate::context::RequestContext;
use crate::request;

/// Field a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    /// Title, author, description, tags and original filename.
    #[default]
    All,
    /// Title only.
    Title,
    /// Author only.
    Author,
    /// Description only.
    Description,
    /// Any tag.
    Tags,
}

/// A search request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for.
    #[validate(length(max = 500))]
    pub q: String,
    /// Field to match.
    #[serde(default)]
    pub field: SearchField,
    /// Only documents of this kind.
    #[serde(default)]
    pub kind: Option<DocumentKind>,
}

/// Search hits, most recently updated first.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Number of hits returned.
    pub count: usize,
    /// The hits.
    pub results: Vec<Document>,
}

/// How many accessible documents carry a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    /// The tag.
    pub name: String,
    /// Number of documents carrying it.
    pub count: usize,
}

/// Searches document metadata.
#[derive(Debug, Clone)]
pub struct SearchService {
    doc_repo: Arc<DocumentRepository>,
    result_limit: usize,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(doc_repo: Arc<DocumentRepository>, config: &SearchConfig) -> Self {
        Self {
            doc_repo,
            result_limit: config.result_limit,
        }
    }

    /// Finds accessible, non-trashed documents matching `query`.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: SearchQuery,
    ) -> AppResult<SearchResults> {
        request::validate(&query)?;
        let needle = request::required(&query.q, "Search query")?.to_lowercase();

        let mut results = self.accessible(ctx).await?;
        results.retain(|d| {
            query.kind.is_none_or(|k| d.kind == k) && matches(d, query.field, &needle)
        });
        results.truncate(self.result_limit);

        debug!(user_id = %ctx.user_id, hits = results.len(), "Search executed");
        Ok(SearchResults {
            count: results.len(),
            results,
        })
    }

    /// Tag usage across accessible, non-trashed documents, most used first.
    pub async fn tags(&self, ctx: &RequestContext) -> AppResult<Vec<TagCount>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for doc in self.accessible(ctx).await? {
            for tag in doc.tags {
                *counts.entry(tag).or_default() += 1;
            }
        }
        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect();
        tags.sort_by(|a, b| {
            b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name))
        });
        Ok(tags)
    }

    async fn accessible(&self, ctx: &RequestContext) -> AppResult<Vec<Document>> {
        self.doc_repo
            .find(
                &DocumentFilter::default()
                    .accessible_to(ctx.user_id)
                    .trashed(false),
                DocumentSort::desc(DocumentSortField::UpdatedAt),
            )
            .await
    }
}

fn matches(doc: &Document, field: SearchField, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    match field {
        SearchField::Title => hit(&doc.title),
        SearchField::Author => hit(&doc.author),
        SearchField::Description => hit(&doc.description),
        SearchField::Tags => doc.tags.iter().any(|t| hit(t)),
        SearchField::All => {
            hit(&doc.title)
                || hit(&doc.author)
                || hit(&doc.description)
                || doc.tags.iter().any(|t| hit(t))
                || hit(&doc.original_filename)
        }
    }
}
