//! Versioned schema migrations
//!
//! Tables themselves are created idempotently by [`super::init`]; this module
//! applies the data and index changes that must happen exactly once, tracking
//! progress in `schema_version`.
//!
//! Never edit an existing migration. Add a new `migrate_vN` and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Star values offered to viewers
pub const DEFAULT_STAR_VALUES: [i64; 5] = [1, 2, 3, 4, 5];

/// Latest applied version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: seed the rating star scale
///
/// Skipped when an administrator already created stars.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rating_stars")
        .fetch_one(pool)
        .await?;

    if existing == 0 {
        for value in DEFAULT_STAR_VALUES {
            sqlx::query("INSERT INTO rating_stars (value) VALUES (?)")
                .bind(value)
                .execute(pool)
                .await?;
        }
        info!("Migration v1: seeded {} rating stars", DEFAULT_STAR_VALUES.len());
    }

    Ok(())
}

/// Migration v2: indexes for the public pages
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_reviews_movie ON reviews(movie_id)",
        "CREATE INDEX IF NOT EXISTS idx_reviews_parent ON reviews(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_movies_draft ON movies(draft, id)",
        "CREATE INDEX IF NOT EXISTS idx_shots_movie ON movie_shots(movie_id)",
    ] {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_database_reaches_current_version() {
        let pool = crate::db::open_in_memory().await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_rerun_does_not_duplicate_stars() {
        let pool = crate::db::open_in_memory().await.unwrap();

        // Pretend nothing ran yet; v1 must notice the existing stars
        sqlx::query("DELETE FROM schema_version")
            .execute(&pool)
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let stars: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rating_stars")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stars, DEFAULT_STAR_VALUES.len() as i64);
    }
}
