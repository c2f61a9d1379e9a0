use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::TmdbConfig;
use super::provider::{CatalogError, CatalogResult, MovieCatalog};
use super::types::*;

/// TMDB v3 API client.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig, api_key: &str) -> CatalogResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| CatalogError::InvalidApiKey)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/search/movie?query={}&page={}",
            self.base_url,
            urlencoding::encode(query),
            page
        )
    }

    fn discover_url(&self, filters: &FilterSet, page: u32) -> String {
        let mut url = format!(
            "{}/discover/movie?sort_by={}&page={}",
            self.base_url,
            filters.sort_by.as_str(),
            page
        );
        if let Some(genre) = filters.genre {
            url.push_str(&format!("&with_genres={}", genre));
        }
        if let Some(year) = filters.year {
            url.push_str(&format!("&primary_release_year={}", year));
        }
        url
    }

    fn genres_url(&self) -> String {
        format!("{}/genre/movie/list", self.base_url)
    }

    fn details_url(&self, id: u64) -> String {
        format!("{}/movie/{}", self.base_url, id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CatalogResult<T> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                endpoint: strip_query(url).to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> CatalogResult<ResultPage<Movie>> {
        let page: TmdbPage = self.get_json(&self.search_url(query, page)).await?;
        Ok(page.into())
    }

    async fn popular(&self, page: u32) -> CatalogResult<ResultPage<Movie>> {
        self.discover(&FilterSet::default(), page).await
    }

    async fn discover(&self, filters: &FilterSet, page: u32) -> CatalogResult<ResultPage<Movie>> {
        let page: TmdbPage = self.get_json(&self.discover_url(filters, page)).await?;
        Ok(page.into())
    }

    async fn genres(&self) -> CatalogResult<Vec<Genre>> {
        let list: TmdbGenreList = self.get_json(&self.genres_url()).await?;
        Ok(list.genres)
    }

    async fn movie_details(&self, id: u64) -> CatalogResult<MovieDetails> {
        self.get_json(&self.details_url(id)).await
    }
}
