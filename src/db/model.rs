use serde::{Deserialize, Serialize};

/// Popularity counter for one search term.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchCount {
    pub search_term: String,
    pub count: i64,
    pub movie_id: Option<i64>,
    pub poster_url: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;
