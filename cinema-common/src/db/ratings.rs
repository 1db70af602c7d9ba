//! Rating stars and per-viewer ratings

use sqlx::SqlitePool;

use super::models::{Rating, RatingStar};
use crate::{Error, Result};

pub async fn list_stars(pool: &SqlitePool) -> Result<Vec<RatingStar>> {
    let stars = sqlx::query_as::<_, RatingStar>("SELECT id, value FROM rating_stars ORDER BY value DESC")
        .fetch_all(pool)
        .await?;

    Ok(stars)
}

/// Record a viewer's rating; a second rating from the same IP replaces the first
pub async fn rate_movie(pool: &SqlitePool, movie_id: i64, ip: &str, star_id: i64) -> Result<Rating> {
    if ip.is_empty() || ip.len() > 15 {
        return Err(Error::InvalidInput(format!("invalid viewer ip {:?}", ip)));
    }

    sqlx::query(
        r#"
        INSERT INTO ratings (ip, star_id, movie_id) VALUES (?, ?, ?)
        ON CONFLICT(movie_id, ip) DO UPDATE SET star_id = excluded.star_id
        "#,
    )
    .bind(ip)
    .bind(star_id)
    .bind(movie_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from_write(e, "rating"))?;

    let rating = sqlx::query_as::<_, Rating>(
        r#"
        SELECT r.id, r.ip, r.star_id, s.value AS star_value, r.movie_id
        FROM ratings r JOIN rating_stars s ON s.id = r.star_id
        WHERE r.movie_id = ? AND r.ip = ?
        "#,
    )
    .bind(movie_id)
    .bind(ip)
    .fetch_one(pool)
    .await?;

    Ok(rating)
}

/// Back-office listing of every rating
pub async fn list_ratings(pool: &SqlitePool) -> Result<Vec<Rating>> {
    let ratings = sqlx::query_as::<_, Rating>(
        r#"
        SELECT r.id, r.ip, r.star_id, s.value AS star_value, r.movie_id
        FROM ratings r JOIN rating_stars s ON s.id = r.star_id
        ORDER BY r.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ratings)
}
