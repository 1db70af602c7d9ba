//! Public movie pages: list, detail, recent, categories

use axum::{
    extract::{Path, Query, State},
    Json,
};
use cinema_common::db::{
    self, actors::Credit, reviews::ReviewThread, Actor, Category, Genre, Movie, MovieShot, RatingStar,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Sidebar length of "recent movies"
pub const DEFAULT_RECENT: i64 = 3;
/// Upper bound on `?count=` for the recent list
pub const MAX_RECENT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

/// GET / response
#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_movies: i64,
    pub movies: Vec<Movie>,
    pub categories: Vec<Category>,
    pub recent: Vec<Movie>,
}

/// GET /
///
/// Published movies only, oldest first.
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<MovieListResponse>> {
    let total = db::movies::count_published(&state.db).await?;
    let pagination = calculate_pagination(total, query.page.unwrap_or(1));

    let movies = db::movies::list_published(&state.db, PAGE_SIZE, pagination.offset).await?;
    let categories = db::categories::list_categories(&state.db).await?;
    let recent = db::movies::recent_published(&state.db, DEFAULT_RECENT).await?;

    Ok(Json(MovieListResponse {
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        total_movies: total,
        movies,
        categories,
        recent,
    }))
}

/// GET /movie/:slug/ response
#[derive(Debug, Serialize)]
pub struct MovieDetailResponse {
    #[serde(flatten)]
    pub movie: Movie,
    pub absolute_url: String,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    pub directors: Vec<Actor>,
    pub actors: Vec<Actor>,
    pub shots: Vec<MovieShot>,
    /// Top-level reviews, each with its replies
    pub reviews: Vec<ReviewThread>,
    /// Choices offered by the rating form
    pub stars: Vec<RatingStar>,
}

/// GET /movie/:slug/
///
/// Drafts are reachable here even though no listing shows them.
pub async fn movie_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<MovieDetailResponse>> {
    let movie = db::movies::get_movie_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("movie {}", slug)))?;

    let category = match movie.category_id {
        Some(id) => db::categories::get_category(&state.db, id).await?,
        None => None,
    };
    let genres = db::categories::genres_for_movie(&state.db, movie.id).await?;
    let directors = db::actors::credited_on(&state.db, movie.id, Credit::Director).await?;
    let actors = db::actors::credited_on(&state.db, movie.id, Credit::Actor).await?;
    let shots = db::shots::shots_for_movie(&state.db, movie.id).await?;
    let reviews = db::reviews::build_thread(db::reviews::reviews_for_movie(&state.db, movie.id).await?);
    let stars = db::ratings::list_stars(&state.db).await?;

    Ok(Json(MovieDetailResponse {
        absolute_url: movie.absolute_url(),
        movie,
        category,
        genres,
        directors,
        actors,
        shots,
        reviews,
        stars,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub count: Option<i64>,
}

/// GET /movies/recent?count=N
pub async fn recent_movies(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Movie>>> {
    let count = query.count.unwrap_or(DEFAULT_RECENT).clamp(0, MAX_RECENT);
    Ok(Json(db::movies::recent_published(&state.db, count).await?))
}

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(db::categories::list_categories(&state.db).await?))
}
