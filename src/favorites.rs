use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::error;

use crate::catalog::Movie;
use crate::db::{DbResult, KeyValueStore};

/// A favorites list stored as one JSON document in a key-value store.
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
    key: String,
    // Serializes read-modify-write cycles on the stored list. Every
    // `Favorites` on the same key must share it.
    write_lock: Arc<Mutex<()>>,
}

impl Favorites {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::with_lock(store, key, Arc::new(Mutex::new(())))
    }

    pub fn with_lock(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        write_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock,
        }
    }

    /// Favorites for one browse session.
    pub fn for_session(store: Arc<dyn KeyValueStore>, session_id: &str) -> Self {
        Self::new(store, Self::session_key(session_id))
    }

    pub fn session_key(session_id: &str) -> String {
        format!("favorites:{}", session_id)
    }

    /// All favorites in the order they were added. A stored list that cannot
    /// be parsed is reported and treated as empty.
    pub async fn list(&self) -> DbResult<Vec<Movie>> {
        let Some(stored) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&stored) {
            Ok(movies) => Ok(movies),
            Err(e) => {
                error!("Error loading favorites {}: {}", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    /// Add a movie unless one with the same id is already present.
    /// Returns whether the list changed.
    pub async fn add(&self, movie: Movie) -> DbResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut movies = self.list().await?;
        if movies.iter().any(|m| m.id == movie.id) {
            return Ok(false);
        }
        movies.push(movie);
        self.save(&movies).await?;
        Ok(true)
    }

    /// Returns whether the list changed.
    pub async fn remove(&self, movie_id: u64) -> DbResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut movies = self.list().await?;
        let before = movies.len();
        movies.retain(|m| m.id != movie_id);
        if movies.len() == before {
            return Ok(false);
        }
        self.save(&movies).await?;
        Ok(true)
    }

    pub async fn is_favorite(&self, movie_id: u64) -> DbResult<bool> {
        if !self.store.contains(&self.key).await? {
            return Ok(false);
        }
        Ok(self.list().await?.iter().any(|m| m.id == movie_id))
    }

    /// Drop the stored list entirely.
    pub async fn clear(&self) -> DbResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.delete(&self.key).await
    }

    async fn save(&self, movies: &[Movie]) -> DbResult<()> {
        // Serializing plain data structs cannot fail.
        let json = serde_json::to_string(movies).unwrap_or_else(|_| "[]".to_string());
        self.store.set(&self.key, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;
    use crate::test_support::{ids, movie};

    async fn store() -> Arc<SqliteRepository> {
        Arc::new(SqliteRepository::new("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_add_deduplicates_by_id() {
        let favorites = Favorites::for_session(store().await, "s1");
        assert!(favorites.add(movie(1)).await.unwrap());
        assert!(favorites.add(movie(2)).await.unwrap());
        assert!(!favorites.add(movie(1)).await.unwrap());

        assert_eq!(ids(&favorites.list().await.unwrap()), vec![1, 2]);
        assert!(favorites.is_favorite(2).await.unwrap());
        assert!(!favorites.is_favorite(3).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove() {
        let favorites = Favorites::for_session(store().await, "s1");
        favorites.add(movie(1)).await.unwrap();
        favorites.add(movie(2)).await.unwrap();

        assert!(favorites.remove(1).await.unwrap());
        assert!(!favorites.remove(1).await.unwrap());
        assert_eq!(ids(&favorites.list().await.unwrap()), vec![2]);
    }

    #[tokio::test]
    async fn test_sessions_are_separate() {
        let store = store().await;
        let a = Favorites::for_session(store.clone(), "a");
        let b = Favorites::for_session(store.clone(), "b");
        a.add(movie(10)).await.unwrap();

        assert!(a.is_favorite(10).await.unwrap());
        assert!(!b.is_favorite(10).await.unwrap());
        assert!(b.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_list_reads_as_empty() {
        let store = store().await;
        store.set("favorites:s1", "not json").await.unwrap();
        let favorites = Favorites::for_session(store, "s1");

        assert!(favorites.list().await.unwrap().is_empty());
        assert!(favorites.add(movie(5)).await.unwrap());
        assert_eq!(ids(&favorites.list().await.unwrap()), vec![5]);
    }

    #[tokio::test]
    async fn test_clear() {
        let favorites = Favorites::for_session(store().await, "s1");
        favorites.add(movie(1)).await.unwrap();
        favorites.clear().await.unwrap();
        assert!(favorites.list().await.unwrap().is_empty());
    }
}
