use serde::Serialize;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch movies. Please try again later.";

/// The only error a listing ever reports to its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch movies. Please try again later.")]
    FetchFailed,
}

/// Observable result of the most recent fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub total_pages: u32,
    pub has_next_page: bool,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            total_pages: 0,
            has_next_page: false,
        }
    }
}

impl<T> FetchState<T> {
    pub fn loaded(items: Vec<T>, page: u32, total_pages: u32) -> Self {
        Self {
            items,
            loading: false,
            error: None,
            total_pages,
            has_next_page: page < total_pages,
        }
    }

    pub fn failed(error: FetchError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

impl<T: Clone> FetchState<T> {
    /// Same results, flagged as loading with any error cleared.
    pub fn to_loading(&self) -> Self {
        Self {
            items: self.items.clone(),
            loading: true,
            error: None,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
        }
    }
}
