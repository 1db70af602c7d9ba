//! Database initialization
//!
//! Opens (creating if needed) the SQLite catalog, creates every table with
//! `CREATE TABLE IF NOT EXISTS`, then runs versioned migrations. Safe to call
//! on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL lets page reads proceed while a review insert is being committed
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Fresh in-memory catalog with the full schema (tests and tooling)
///
/// Uses a single connection that never expires, since every SQLite
/// in-memory connection would otherwise see its own empty database.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables, then bring the schema up to the current version
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;

    create_categories_table(pool).await?;
    create_genres_table(pool).await?;
    create_actors_table(pool).await?;
    create_movies_table(pool).await?;
    create_movie_shots_table(pool).await?;

    // Relation tables: one entity (actors) in two roles
    create_movie_link_table(pool, "movie_genres", "genre_id", "genres").await?;
    create_movie_link_table(pool, "movie_directors", "actor_id", "actors").await?;
    create_movie_link_table(pool, "movie_actors", "actor_id", "actors").await?;

    create_rating_tables(pool).await?;
    create_reviews_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Key-value settings (holds the back-office shared secret)
async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) <= 150),
            description TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL UNIQUE CHECK (length(url) BETWEEN 1 AND 160)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) <= 100),
            description TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL UNIQUE CHECK (length(url) BETWEEN 1 AND 160)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_actors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) <= 100),
            age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
            description TEXT NOT NULL DEFAULT '',
            image TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(title) <= 100),
            tagline TEXT NOT NULL DEFAULT '' CHECK (length(tagline) <= 100),
            description TEXT NOT NULL DEFAULT '',
            poster TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL DEFAULT 2019,
            country TEXT NOT NULL DEFAULT '' CHECK (length(country) <= 30),
            world_premiere DATE NOT NULL DEFAULT CURRENT_DATE,
            budget INTEGER NOT NULL DEFAULT 0 CHECK (budget >= 0),
            fees_in_usa INTEGER NOT NULL DEFAULT 0 CHECK (fees_in_usa >= 0),
            fees_in_world INTEGER NOT NULL DEFAULT 0 CHECK (fees_in_world >= 0),
            category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
            url TEXT NOT NULL UNIQUE CHECK (length(url) BETWEEN 1 AND 160),
            draft INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_movie_shots_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_shots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(title) <= 100),
            description TEXT NOT NULL DEFAULT '',
            image TEXT NOT NULL DEFAULT '',
            movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Many-to-many table between movies and `target`
async fn create_movie_link_table(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    target: &str,
) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            {column} INTEGER NOT NULL REFERENCES {target}(id) ON DELETE CASCADE,
            PRIMARY KEY (movie_id, {column})
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

async fn create_rating_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rating_stars (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            value INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ip TEXT NOT NULL CHECK (length(ip) <= 15),
            star_id INTEGER NOT NULL REFERENCES rating_stars(id) ON DELETE CASCADE,
            movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            UNIQUE (movie_id, ip)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Reviews: parent is a nullable self reference, cleared when the parent goes
async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL CHECK (length(email) <= 254),
            name TEXT NOT NULL CHECK (length(name) <= 100),
            text TEXT NOT NULL CHECK (length(text) <= 5000),
            parent_id INTEGER REFERENCES reviews(id) ON DELETE SET NULL,
            movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = open_in_memory().await.unwrap();
        create_schema(&pool).await.expect("second run should succeed");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in [
            "actors",
            "categories",
            "genres",
            "movie_actors",
            "movie_directors",
            "movie_genres",
            "movie_shots",
            "movies",
            "rating_stars",
            "ratings",
            "reviews",
            "schema_version",
            "settings",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let pool = open_in_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO reviews (email, name, text, movie_id) VALUES ('a@b.co', 'A', 'x', 999)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err(), "review for a missing movie must be rejected");
    }
}
