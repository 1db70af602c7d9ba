//! Back-office JSON API
//!
//! All routes here sit behind [`super::auth_middleware`]. Request bodies may
//! carry the `timestamp` and `hash` auth fields next to the payload; the
//! payload types ignore them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cinema_common::db::{
    self, movies::MovieFilter, Actor, Category, Genre, Movie, MovieShot, NewActor, NewCategory,
    NewGenre, NewMovie, NewMovieShot, Rating, RatingStar, Review,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

// ============================================================================
// Catalog creation
// ============================================================================

/// POST /admin/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(new): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = db::categories::create_category(&state.db, &new).await?;
    info!("Created category {} ({})", category.id, category.url);
    Ok((StatusCode::CREATED, Json(category)))
}

/// POST /admin/genres
pub async fn create_genre(
    State(state): State<AppState>,
    Json(new): Json<NewGenre>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    let genre = db::categories::create_genre(&state.db, &new).await?;
    info!("Created genre {} ({})", genre.id, genre.url);
    Ok((StatusCode::CREATED, Json(genre)))
}

/// POST /admin/actors
pub async fn create_actor(
    State(state): State<AppState>,
    Json(new): Json<NewActor>,
) -> ApiResult<(StatusCode, Json<Actor>)> {
    let actor = db::actors::create_actor(&state.db, &new).await?;
    info!("Created actor {} ({})", actor.id, actor.name);
    Ok((StatusCode::CREATED, Json(actor)))
}

/// POST /admin/movies
pub async fn create_movie(
    State(state): State<AppState>,
    Json(new): Json<NewMovie>,
) -> ApiResult<(StatusCode, Json<Movie>)> {
    let movie = db::movies::create_movie(&state.db, &new).await?;
    info!("Created movie {} ({}, draft={})", movie.id, movie.url, movie.draft);
    Ok((StatusCode::CREATED, Json(movie)))
}

/// POST /admin/movies/:id/shots
pub async fn create_shot(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Json(new): Json<NewMovieShot>,
) -> ApiResult<(StatusCode, Json<MovieShot>)> {
    if db::movies::get_movie(&state.db, movie_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("movie {}", movie_id)));
    }
    let shot = db::shots::create_shot(&state.db, movie_id, &new).await?;
    Ok((StatusCode::CREATED, Json(shot)))
}

// ============================================================================
// Movie listing and draft flag
// ============================================================================

/// GET /admin/movies?category=&year=&q=
pub async fn list_movies(
    State(state): State<AppState>,
    Query(filter): Query<MovieFilter>,
) -> ApiResult<Json<Vec<Movie>>> {
    Ok(Json(db::movies::search_movies(&state.db, &filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub draft: bool,
}

/// POST /admin/movies/:id/draft
pub async fn set_movie_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<DraftRequest>,
) -> ApiResult<Json<Movie>> {
    if !db::movies::set_draft(&state.db, id, request.draft).await? {
        return Err(ApiError::NotFound(format!("movie {}", id)));
    }
    let movie = db::movies::get_movie(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("movie {}", id)))?;
    Ok(Json(movie))
}

/// Selection of a bulk action
#[derive(Debug, Deserialize)]
pub struct BulkSelection {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BulkResult {
    pub updated: u64,
    pub message: String,
}

impl BulkResult {
    pub fn new(updated: u64) -> Self {
        let message = if updated == 1 {
            "1 record updated".to_string()
        } else {
            format!("{} records updated", updated)
        };
        Self { updated, message }
    }
}

/// POST /admin/movies/publish
pub async fn publish_movies(
    State(state): State<AppState>,
    Json(selection): Json<BulkSelection>,
) -> ApiResult<Json<BulkResult>> {
    let updated = db::movies::set_draft_bulk(&state.db, &selection.ids, false).await?;
    info!("Published {} movie(s)", updated);
    Ok(Json(BulkResult::new(updated)))
}

/// POST /admin/movies/unpublish
pub async fn unpublish_movies(
    State(state): State<AppState>,
    Json(selection): Json<BulkSelection>,
) -> ApiResult<Json<BulkResult>> {
    let updated = db::movies::set_draft_bulk(&state.db, &selection.ids, true).await?;
    info!("Unpublished {} movie(s)", updated);
    Ok(Json(BulkResult::new(updated)))
}

// ============================================================================
// Review moderation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewFilter {
    #[serde(default)]
    pub movie: Option<i64>,
}

/// GET /admin/reviews?movie=
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(db::reviews::list_reviews(&state.db, filter.movie).await?))
}

/// Only the text of a review can be edited
#[derive(Debug, Deserialize)]
pub struct ReviewEdit {
    pub text: String,
}

/// POST /admin/reviews/:id
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(edit): Json<ReviewEdit>,
) -> ApiResult<Json<Review>> {
    let review = db::reviews::update_review_text(&state.db, id, &edit.text).await?;
    info!("Edited review {}", id);
    Ok(Json(review))
}

/// DELETE /admin/reviews/:id
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !db::reviews::delete_review(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("review {}", id)));
    }
    info!("Deleted review {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Ratings
// ============================================================================

/// GET /admin/ratings
pub async fn list_ratings(State(state): State<AppState>) -> ApiResult<Json<Vec<Rating>>> {
    Ok(Json(db::ratings::list_ratings(&state.db).await?))
}

/// GET /admin/stars
pub async fn list_stars(State(state): State<AppState>) -> ApiResult<Json<Vec<RatingStar>>> {
    Ok(Json(db::ratings::list_stars(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_message_wording() {
        assert_eq!(BulkResult::new(1).message, "1 record updated");
        assert_eq!(BulkResult::new(0).message, "0 records updated");
        assert_eq!(BulkResult::new(7).message, "7 records updated");
    }
}
