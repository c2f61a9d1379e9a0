use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::catalog::{image_url, Genre, ImageSize, Movie};
use crate::fetcher::{PageSource, PagedFetcher};
use crate::pagination::page_window;
use crate::server::AppState;
use crate::trending::TrendingEntry;
use super::types::*;

const DETAILS_FAILED_MESSAGE: &str = "Failed to load movie details";

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            id: session.id.clone(),
        }),
    )
}

pub async fn put_search(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Result<(StatusCode, Json<ListingView>), StatusCode> {
    if req.page == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let session = state.sessions.get_or_create(&session_id).await;
    session.search.observe(req.query, req.page).await;
    let view = listing_view(&state, &session.search, false).await;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub async fn get_search(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<ListingParams>,
) -> Json<ListingView> {
    let session = state.sessions.get_or_create(&session_id).await;
    Json(listing_view(&state, &session.search, params.wait).await)
}

pub async fn put_discover(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<DiscoverRequest>,
) -> Result<(StatusCode, Json<ListingView>), StatusCode> {
    if req.page == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let session = state.sessions.get_or_create(&session_id).await;
    session.discover.observe(req.filters(), req.page).await;
    let view = listing_view(&state, &session.discover, false).await;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub async fn get_discover(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<ListingParams>,
) -> Json<ListingView> {
    let session = state.sessions.get_or_create(&session_id).await;
    Json(listing_view(&state, &session.discover, params.wait).await)
}

async fn listing_view<S>(state: &AppState, fetcher: &PagedFetcher<S>, wait: bool) -> ListingView
where
    S: PageSource<Item = Movie>,
{
    if wait {
        let mut rx = fetcher.subscribe();
        let limit = Duration::from_secs(state.config.tmdb.timeout_secs);
        let timed_out = tokio::time::timeout(limit, rx.wait_for(|s| !s.loading))
            .await
            .is_err();
        if timed_out {
            warn!("Gave up waiting for listing after {:?}", limit);
        }
    }

    let page = fetcher.current().await.map(|(_, page)| page).unwrap_or(1);
    let fetch_state = fetcher.state();
    let window = page_window(page, fetch_state.total_pages, state.config.browse.page_window);

    ListingView {
        state: fetch_state,
        window,
    }
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Movie>>, StatusCode> {
    let session = state.sessions.get_or_create(&session_id).await;
    let movies = session.favorites.list().await.map_err(|e| {
        error!("Error loading favorites for {}: {}", session_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(movies))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(movie): Json<Movie>,
) -> StatusCode {
    let session = state.sessions.get_or_create(&session_id).await;
    match session.favorites.add(movie).await {
        Ok(_) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("Error adding favorite for {}: {}", session_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn clear_favorites(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    let session = state.sessions.get_or_create(&session_id).await;
    match session.favorites.clear().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("Error clearing favorites for {}: {}", session_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn get_favorite(
    State(state): State<AppState>,
    Path((session_id, movie_id)): Path<(String, u64)>,
) -> Result<Json<FavoriteStatus>, StatusCode> {
    let session = state.sessions.get_or_create(&session_id).await;
    let favorite = session
        .favorites
        .is_favorite(movie_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(FavoriteStatus { favorite }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((session_id, movie_id)): Path<(String, u64)>,
) -> StatusCode {
    let session = state.sessions.get_or_create(&session_id).await;
    match session.favorites.remove(movie_id).await {
        Ok(_) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("Error removing favorite {} for {}: {}", movie_id, session_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn get_trending(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrendingEntry>>, StatusCode> {
    let trending = state
        .stats
        .trending(state.config.browse.trending_limit)
        .await
        .map_err(|e| {
            error!("Error loading trending movies: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(trending))
}

pub async fn get_genres(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, StatusCode> {
    let genres = state.catalog.genres().await.map_err(|e| {
        error!("Error loading genres: {}", e);
        StatusCode::BAD_GATEWAY
    })?;
    Ok(Json(genres))
}

pub async fn get_movie(State(state): State<AppState>, Path(movie_id): Path<u64>) -> Response {
    match state.catalog.movie_details(movie_id).await {
        Ok(details) => {
            let base = &state.config.tmdb.image_base_url;
            let poster_url = image_url(base, details.poster_path.as_deref(), ImageSize::Poster);
            let backdrop_url =
                image_url(base, details.backdrop_path.as_deref(), ImageSize::Backdrop);
            Json(MovieDetailsView {
                details,
                poster_url,
                backdrop_url,
            })
            .into_response()
        }
        Err(e) => {
            error!("Error fetching movie details for {}: {}", movie_id, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: DETAILS_FAILED_MESSAGE.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::catalog::FilterSet;
    use crate::config::Config;
    use crate::db::SqliteRepository;
    use crate::server::{build_router, AppState};
    use crate::test_support::*;

    async fn app_state(catalog: Arc<MockCatalog>) -> AppState {
        let db = Arc::new(SqliteRepository::new("sqlite::memory:").await.unwrap());
        let config = Config::from_yaml("{}").unwrap();
        AppState::new(config, db, catalog)
    }

    async fn app(catalog: Arc<MockCatalog>) -> axum::Router {
        build_router(app_state(catalog).await)
    }

    async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (u16, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_create_session() {
        let app = app(Arc::default()).await;
        let (status, body) = send(&app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, 201);
        assert!(!body["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_flow() {
        let catalog = Arc::new(MockCatalog::default());
        catalog.set_result("search:batman:1", page_of(&[272, 268], 12)).await;
        let app = app(catalog.clone()).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/sessions/s1/search",
            Some(json!({"query": "batman", "page": 1})),
        )
        .await;
        assert_eq!(status, 202);
        assert_eq!(body["window"]["currentPage"], 1);

        let (status, body) = send(&app, Method::GET, "/api/sessions/s1/search?wait=true", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["state"]["loading"], false);
        assert_eq!(body["state"]["items"][0]["id"], 272);
        assert_eq!(body["state"]["totalPages"], 12);
        assert_eq!(body["state"]["hasNextPage"], true);
        assert_eq!(body["window"]["pages"], json!([1, 2, 3, 4, 5]));
        assert_eq!(body["window"]["showLast"], true);
    }

    #[tokio::test]
    async fn test_search_feeds_trending() {
        let catalog = Arc::new(MockCatalog::default());
        catalog.set_result("search:batman:1", page_of(&[272, 268], 12)).await;
        let state = app_state(catalog).await;
        let app = build_router(state.clone());

        let session = state.sessions.get_or_create("s1").await;
        session
            .search
            .observe("batman".to_string(), 1)
            .await
            .unwrap()
            .await
            .unwrap();

        let (status, trending) = send(&app, Method::GET, "/api/trending", None).await;
        assert_eq!(status, 200);
        assert_eq!(trending[0]["searchTerm"], "batman");
        assert_eq!(trending[0]["count"], 1);
        assert_eq!(trending[0]["movieId"], 272);
    }

    #[tokio::test]
    async fn test_search_with_huge_page() {
        let app = app(Arc::default()).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/sessions/s1/search",
            Some(json!({"query": "x", "page": u32::MAX})),
        )
        .await;
        assert_eq!(status, 202);
        assert_eq!(body["window"]["currentPage"], u32::MAX);

        let (status, body) = send(&app, Method::GET, "/api/sessions/s1/search?wait=true", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["state"]["loading"], false);
        assert_eq!(body["window"]["pages"], json!([]));
    }

    #[tokio::test]
    async fn test_search_rejects_page_zero() {
        let app = app(Arc::default()).await;
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/sessions/s1/search",
            Some(json!({"query": "x", "page": 0})),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_discover_failure_reports_fetch_failed() {
        let catalog = Arc::new(MockCatalog::default());
        let filters = FilterSet {
            genre: Some(28),
            ..FilterSet::default()
        };
        catalog.set_failing(&discover_key(&filters, 1)).await;
        let app = app(catalog).await;

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/sessions/s1/discover",
            Some(json!({"genre": 28})),
        )
        .await;
        assert_eq!(status, 202);

        let (_, body) = send(&app, Method::GET, "/api/sessions/s1/discover?wait=true", None).await;
        assert_eq!(
            body["state"]["error"],
            "Failed to fetch movies. Please try again later."
        );
        assert_eq!(body["state"]["items"], json!([]));
        assert_eq!(body["window"]["pages"], json!([]));
    }

    #[tokio::test]
    async fn test_favorites() {
        let app = app(Arc::default()).await;
        let movie = serde_json::to_value(movie(603)).unwrap();

        let (status, _) = send(&app, Method::PUT, "/api/sessions/s1/favorites", Some(movie.clone())).await;
        assert_eq!(status, 204);
        send(&app, Method::PUT, "/api/sessions/s1/favorites", Some(movie)).await;

        let (_, list) = send(&app, Method::GET, "/api/sessions/s1/favorites", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        let (_, fav) = send(&app, Method::GET, "/api/sessions/s1/favorites/603", None).await;
        assert_eq!(fav["favorite"], true);

        let (code, _) = send(&app, Method::DELETE, "/api/sessions/s1/favorites/603", None).await;
        assert_eq!(code, 204);
        let (_, fav) = send(&app, Method::GET, "/api/sessions/s1/favorites/603", None).await;
        assert_eq!(fav["favorite"], false);
    }

    #[tokio::test]
    async fn test_movie_details() {
        let catalog = Arc::new(MockCatalog::default());
        catalog.set_failing("movie:13").await;
        let app = app(catalog).await;

        let (status, body) = send(&app, Method::GET, "/api/movies/550", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["id"], 550);
        assert_eq!(body["posterUrl"], "https://image.tmdb.org/t/p/w500/poster550.jpg");
        assert!(body["backdropUrl"].is_null());

        let (status, body) = send(&app, Method::GET, "/api/movies/13", None).await;
        assert_eq!(status, 502);
        assert_eq!(body["error"], "Failed to load movie details");
    }

    #[tokio::test]
    async fn test_genres() {
        let catalog = Arc::new(MockCatalog::default());
        let app = app(catalog.clone()).await;
        let (status, body) = send(&app, Method::GET, "/api/genres", None).await;
        assert_eq!(status, 200);
        assert_eq!(body[0]["name"], "Action");

        catalog.set_failing("genres").await;
        let (status, _) = send(&app, Method::GET, "/api/genres", None).await;
        assert_eq!(status, 502);
    }
}
