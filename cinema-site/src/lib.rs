//! cinema-site library - public movie catalog and back office
//!
//! Public pages list and show movies; visitors post threaded reviews through
//! the review workflow. The back office under `/admin` curates the catalog
//! and requires signed requests.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;
pub mod review_workflow;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalog database pool
    pub db: SqlitePool,
    /// Shared secret for back-office authentication (0 disables it)
    pub shared_secret: i64,
    /// Answer 422 to invalid review forms instead of dropping them silently
    pub reject_invalid_reviews: bool,
}

impl AppState {
    /// Create new application state with lenient review handling
    pub fn new(db: SqlitePool, shared_secret: i64) -> Self {
        Self {
            db,
            shared_secret,
            reject_invalid_reviews: false,
        }
    }

    pub fn with_reject_invalid_reviews(mut self, reject: bool) -> Self {
        self.reject_invalid_reviews = reject;
        self
    }
}

/// Build application router
///
/// Health and public pages need no auth; everything under `/admin` does.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/admin/categories", post(api::admin::create_category))
        .route("/admin/genres", post(api::admin::create_genre))
        .route("/admin/actors", post(api::admin::create_actor))
        .route(
            "/admin/movies",
            get(api::admin::list_movies).post(api::admin::create_movie),
        )
        .route("/admin/movies/publish", post(api::admin::publish_movies))
        .route("/admin/movies/unpublish", post(api::admin::unpublish_movies))
        .route("/admin/movies/:id/draft", post(api::admin::set_movie_draft))
        .route("/admin/movies/:id/shots", post(api::admin::create_shot))
        .route("/admin/reviews", get(api::admin::list_reviews))
        .route(
            "/admin/reviews/:id",
            post(api::admin::update_review).delete(api::admin::delete_review),
        )
        .route("/admin/ratings", get(api::admin::list_ratings))
        .route("/admin/stars", get(api::admin::list_stars))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication); detail pages answer with and
    // without the trailing slash
    let public = Router::new()
        .route("/", get(api::list_movies))
        .route("/movies/recent", get(api::recent_movies))
        .route("/categories", get(api::list_categories))
        .route("/movie/:slug", get(api::movie_detail))
        .route("/movie/:slug/", get(api::movie_detail))
        .route("/actor/:name", get(api::actor_detail))
        .route("/actor/:name/", get(api::actor_detail))
        .route("/review/:movie_id", post(api::submit_review))
        .route("/review/:movie_id/", post(api::submit_review))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
