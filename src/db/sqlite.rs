use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection.
        let pool = if db_path.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SearchCountRepo for SqliteRepository {
    async fn increment_search(
        &self,
        search_term: &str,
        movie_id: Option<i64>,
        poster_url: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO search_counts (search_term, count, movie_id, poster_url, created, updated)
             VALUES (?, 1, ?, ?, ?, ?)
             ON CONFLICT(search_term) DO UPDATE SET count = count + 1, updated = excluded.updated",
        )
        .bind(search_term)
        .bind(movie_id)
        .bind(poster_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_search(&self, search_term: &str) -> DbResult<SearchCount> {
        sqlx::query_as::<_, SearchCount>(
            "SELECT search_term, count, movie_id, poster_url, created, updated
             FROM search_counts WHERE search_term = ?",
        )
        .bind(search_term)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Search term not found: {}", search_term)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn top_searches(&self, limit: u32) -> DbResult<Vec<SearchCount>> {
        let rows = sqlx::query_as::<_, SearchCount>(
            "SELECT search_term, count, movie_id, poster_url, created, updated
             FROM search_counts ORDER BY count DESC, updated DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn contains(&self, key: &str) -> DbResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM kv WHERE key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn delete(&self, key: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
