use serde::{Deserialize, Serialize};

use crate::catalog::{FilterSet, Movie, MovieDetails, SortOrder};
use crate::fetcher::FetchState;
use crate::pagination::PageWindow;

#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverRequest {
    #[serde(default)]
    pub genre: Option<u32>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default, rename = "sortBy")]
    pub sort_by: SortOrder,
    #[serde(default = "default_page")]
    pub page: u32,
}

impl DiscoverRequest {
    pub fn filters(&self) -> FilterSet {
        FilterSet {
            genre: self.genre,
            year: self.year,
            sort_by: self.sort_by,
        }
    }
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    /// Block until the pending fetch, if any, has finished.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    pub state: FetchState<Movie>,
    pub window: PageWindow,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteStatus {
    pub favorite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetailsView {
    #[serde(flatten)]
    pub details: MovieDetails,
    #[serde(rename = "posterUrl")]
    pub poster_url: Option<String>,
    #[serde(rename = "backdropUrl")]
    pub backdrop_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
