use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::catalog::{image_url, ImageSize, Movie};
use crate::db::{DbResult, SearchCount, SearchCountRepo};
use crate::fetcher::{RecordError, UsageRecorder};

/// Search popularity counters, fed by first-page search results.
pub struct SearchStats {
    repo: Arc<dyn SearchCountRepo>,
    image_base_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    pub search_term: String,
    pub count: i64,
    pub movie_id: Option<i64>,
    pub poster_url: Option<String>,
}

impl From<SearchCount> for TrendingEntry {
    fn from(row: SearchCount) -> Self {
        Self {
            search_term: row.search_term,
            count: row.count,
            movie_id: row.movie_id,
            poster_url: row.poster_url,
        }
    }
}

impl SearchStats {
    pub fn new(repo: Arc<dyn SearchCountRepo>, image_base_url: &str) -> Self {
        Self {
            repo,
            image_base_url: image_base_url.to_string(),
        }
    }

    /// The most searched terms, most popular first.
    pub async fn trending(&self, limit: u32) -> DbResult<Vec<TrendingEntry>> {
        let rows = self.repo.top_searches(limit).await?;
        Ok(rows.into_iter().map(TrendingEntry::from).collect())
    }
}

#[async_trait]
impl UsageRecorder<Movie> for SearchStats {
    async fn record(&self, term: &str, item: &Movie) -> Result<(), RecordError> {
        let poster_url = image_url(
            &self.image_base_url,
            item.poster_path.as_deref(),
            ImageSize::Poster,
        );
        self.repo
            .increment_search(term, i64::try_from(item.id).ok(), poster_url.as_deref())
            .await?;
        debug!("Recorded search {:?} (movie {})", term, item.id);
        Ok(())
    }
}
