pub mod image;
pub mod provider;
pub mod tmdb;
pub mod types;

pub use image::{image_url, ImageSize};
pub use provider::{CatalogError, CatalogResult, MovieCatalog};
pub use tmdb::TmdbClient;
pub use types::{FilterSet, Genre, Movie, MovieDetails, ResultPage, SortOrder};
