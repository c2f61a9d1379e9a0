use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait SearchCountRepo: Send + Sync {
    /// Bump the counter for `search_term`, creating it at 1 if new.
    /// `movie_id` and `poster_url` are only stored on creation.
    async fn increment_search(
        &self,
        search_term: &str,
        movie_id: Option<i64>,
        poster_url: Option<&str>,
    ) -> DbResult<()>;
    async fn get_search(&self, search_term: &str) -> DbResult<SearchCount>;
    async fn top_searches(&self, limit: u32) -> DbResult<Vec<SearchCount>>;
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> DbResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> DbResult<()>;
    async fn contains(&self, key: &str) -> DbResult<bool>;
    async fn delete(&self, key: &str) -> DbResult<()>;
}
