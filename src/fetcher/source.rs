use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{CatalogResult, FilterSet, Movie, MovieCatalog, ResultPage};
use crate::db::DbError;

/// Maps a query and page to one collaborator call.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    type Query: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(&self, query: &Self::Query, page: u32) -> CatalogResult<ResultPage<Self::Item>>;

    /// The search term to report to a usage recorder, if this query is a search.
    fn usage_term<'a>(&self, _query: &'a Self::Query) -> Option<&'a str> {
        None
    }
}

/// Receives the first result of a fresh search.
#[async_trait]
pub trait UsageRecorder<T>: Send + Sync {
    async fn record(&self, term: &str, item: &T) -> Result<(), RecordError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Failed to record search: {0}")]
    Database(#[from] DbError),
}

/// Free-text search, falling back to the default listing for an empty term.
pub struct SearchSource {
    catalog: Arc<dyn MovieCatalog>,
}

impl SearchSource {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PageSource for SearchSource {
    type Query = String;
    type Item = Movie;

    async fn fetch_page(&self, query: &String, page: u32) -> CatalogResult<ResultPage<Movie>> {
        if query.is_empty() {
            self.catalog.popular(page).await
        } else {
            self.catalog.search(query, page).await
        }
    }

    fn usage_term<'a>(&self, query: &'a String) -> Option<&'a str> {
        if query.is_empty() {
            None
        } else {
            Some(query.as_str())
        }
    }
}

/// Filtered listing by genre, year and sort order.
pub struct DiscoverSource {
    catalog: Arc<dyn MovieCatalog>,
}

impl DiscoverSource {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PageSource for DiscoverSource {
    type Query = FilterSet;
    type Item = Movie;

    async fn fetch_page(&self, query: &FilterSet, page: u32) -> CatalogResult<ResultPage<Movie>> {
        self.catalog.discover(query, page).await
    }
}
