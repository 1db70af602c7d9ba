//! Stills from a movie

use sqlx::SqlitePool;

use super::models::{check_len, check_required, MovieShot, NewMovieShot};
use crate::{Error, Result};

pub async fn create_shot(pool: &SqlitePool, movie_id: i64, new: &NewMovieShot) -> Result<MovieShot> {
    check_required("title", &new.title)?;
    check_len("title", &new.title, 100)?;

    let id = sqlx::query(
        "INSERT INTO movie_shots (title, description, image, movie_id) VALUES (?, ?, ?, ?)",
    )
    .bind(new.title.trim())
    .bind(&new.description)
    .bind(&new.image)
    .bind(movie_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from_write(e, &format!("shot for movie {}", movie_id)))?
    .last_insert_rowid();

    let shot = sqlx::query_as::<_, MovieShot>(
        "SELECT id, title, description, image, movie_id FROM movie_shots WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(shot)
}

pub async fn shots_for_movie(pool: &SqlitePool, movie_id: i64) -> Result<Vec<MovieShot>> {
    let shots = sqlx::query_as::<_, MovieShot>(
        "SELECT id, title, description, image, movie_id FROM movie_shots WHERE movie_id = ? ORDER BY id",
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    Ok(shots)
}
