use async_trait::async_trait;

use super::types::{FilterSet, Genre, Movie, MovieDetails, ResultPage};

/// Remote movie metadata source.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn search(&self, query: &str, page: u32) -> CatalogResult<ResultPage<Movie>>;
    /// The default listing shown when there is no search term.
    async fn popular(&self, page: u32) -> CatalogResult<ResultPage<Movie>>;
    async fn discover(&self, filters: &FilterSet, page: u32) -> CatalogResult<ResultPage<Movie>>;
    async fn genres(&self) -> CatalogResult<Vec<Genre>>;
    async fn movie_details(&self, id: u64) -> CatalogResult<MovieDetails>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

pub type CatalogResult<T> = Result<T, CatalogError>;
