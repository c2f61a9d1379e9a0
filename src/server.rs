use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::browse::SessionRegistry;
use crate::catalog::MovieCatalog;
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::trending::SearchStats;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub stats: Arc<SearchStats>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, catalog: Arc<dyn MovieCatalog>) -> Self {
        let stats = Arc::new(SearchStats::new(db.clone(), &config.tmdb.image_base_url));
        let sessions = Arc::new(SessionRegistry::new(
            catalog.clone(),
            stats.clone(),
            db.clone(),
        ));

        Self {
            config: Arc::new(config),
            db,
            catalog,
            stats,
            sessions,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/sessions", post(crate::api::create_session))
        .route(
            "/api/sessions/:id/search",
            get(crate::api::get_search).put(crate::api::put_search),
        )
        .route(
            "/api/sessions/:id/discover",
            get(crate::api::get_discover).put(crate::api::put_discover),
        )
        .route(
            "/api/sessions/:id/favorites",
            get(crate::api::list_favorites)
                .put(crate::api::add_favorite)
                .delete(crate::api::clear_favorites),
        )
        .route(
            "/api/sessions/:id/favorites/:movie_id",
            get(crate::api::get_favorite).delete(crate::api::remove_favorite),
        )
        .route("/api/trending", get(crate::api::get_trending))
        .route("/api/genres", get(crate::api::get_genres))
        .route("/api/movies/:id", get(crate::api::get_movie));

    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
