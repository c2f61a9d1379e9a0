//! Mock collaborators shared by unit tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};

use crate::catalog::*;
use crate::db::DbError;
use crate::fetcher::{RecordError, UsageRecorder};

pub fn movie(id: u64) -> Movie {
    Movie {
        id,
        title: format!("Movie {}", id),
        poster_path: Some(format!("/poster{}.jpg", id)),
        ..Movie::default()
    }
}

pub fn page_of(ids: &[u64], total_pages: u32) -> ResultPage<Movie> {
    ResultPage::new(ids.iter().map(|id| movie(*id)).collect(), total_pages)
}

pub fn ids(movies: &[Movie]) -> Vec<u64> {
    movies.iter().map(|m| m.id).collect()
}

pub fn discover_key(filters: &FilterSet, page: u32) -> String {
    format!(
        "discover:{:?}:{:?}:{}:{}",
        filters.genre,
        filters.year,
        filters.sort_by.as_str(),
        page
    )
}

/// Catalog answering from canned results keyed by call, e.g. `search:batman:1`.
/// Unknown keys answer with an empty page.
#[derive(Default)]
pub struct MockCatalog {
    calls: Mutex<Vec<String>>,
    results: Mutex<HashMap<String, ResultPage<Movie>>>,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl MockCatalog {
    pub async fn set_result(&self, key: &str, page: ResultPage<Movie>) {
        self.results.lock().await.insert(key.to_string(), page);
    }

    pub async fn set_failing(&self, key: &str) {
        self.failing.lock().await.insert(key.to_string());
    }

    /// Hold the next call for `key` until the returned sender fires.
    pub async fn gate(&self, key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(key.to_string(), rx);
        tx
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, key: &str) -> CatalogResult<()> {
        self.calls.lock().await.push(key.to_string());
        let gate = self.gates.lock().await.remove(key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.failing.lock().await.contains(key) {
            return Err(CatalogError::Status {
                endpoint: key.to_string(),
                status: 500,
            });
        }
        Ok(())
    }

    async fn respond(&self, key: String) -> CatalogResult<ResultPage<Movie>> {
        self.enter(&key).await?;
        Ok(self
            .results
            .lock()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_else(ResultPage::empty))
    }
}

#[async_trait]
impl MovieCatalog for MockCatalog {
    async fn search(&self, query: &str, page: u32) -> CatalogResult<ResultPage<Movie>> {
        self.respond(format!("search:{}:{}", query, page)).await
    }

    async fn popular(&self, page: u32) -> CatalogResult<ResultPage<Movie>> {
        self.respond(format!("popular:{}", page)).await
    }

    async fn discover(&self, filters: &FilterSet, page: u32) -> CatalogResult<ResultPage<Movie>> {
        self.respond(discover_key(filters, page)).await
    }

    async fn genres(&self) -> CatalogResult<Vec<Genre>> {
        self.enter("genres").await?;
        Ok(vec![
            Genre { id: 28, name: "Action".to_string() },
            Genre { id: 35, name: "Comedy".to_string() },
        ])
    }

    async fn movie_details(&self, id: u64) -> CatalogResult<MovieDetails> {
        self.enter(&format!("movie:{}", id)).await?;
        Ok(MovieDetails {
            id,
            title: format!("Movie {}", id),
            poster_path: Some(format!("/poster{}.jpg", id)),
            ..MovieDetails::default()
        })
    }
}

/// Remembers every record call; optionally fails each one.
#[derive(Default)]
pub struct MockRecorder {
    records: Mutex<Vec<(String, u64)>>,
    fail: bool,
}

impl MockRecorder {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn records(&self) -> Vec<(String, u64)> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl UsageRecorder<Movie> for MockRecorder {
    async fn record(&self, term: &str, item: &Movie) -> Result<(), RecordError> {
        self.records.lock().await.push((term.to_string(), item.id));
        if self.fail {
            return Err(RecordError::Database(DbError::NotFound(term.to_string())));
        }
        Ok(())
    }
}
