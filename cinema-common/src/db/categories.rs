//! Categories and genres

use sqlx::SqlitePool;

use super::models::{check_len, check_required, Category, Genre, NewCategory, NewGenre};
use crate::{Error, Result};

pub async fn create_category(pool: &SqlitePool, new: &NewCategory) -> Result<Category> {
    check_required("name", &new.name)?;
    check_len("name", &new.name, 150)?;

    let id = sqlx::query("INSERT INTO categories (name, description, url) VALUES (?, ?, ?)")
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.url.as_str())
        .execute(pool)
        .await
        .map_err(|e| Error::from_write(e, &format!("category {}", new.url)))?
        .last_insert_rowid();

    get_category(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("category {} vanished after insert", id)))
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, url FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

pub async fn get_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, url FROM categories WHERE url = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

/// All categories, by id (the sidebar listing)
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, url FROM categories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn create_genre(pool: &SqlitePool, new: &NewGenre) -> Result<Genre> {
    check_required("name", &new.name)?;
    check_len("name", &new.name, 100)?;

    let id = sqlx::query("INSERT INTO genres (name, description, url) VALUES (?, ?, ?)")
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.url.as_str())
        .execute(pool)
        .await
        .map_err(|e| Error::from_write(e, &format!("genre {}", new.url)))?
        .last_insert_rowid();

    let genre = sqlx::query_as::<_, Genre>(
        "SELECT id, name, description, url FROM genres WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(genre)
}

pub async fn list_genres(pool: &SqlitePool) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>("SELECT id, name, description, url FROM genres ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}

pub async fn genres_for_movie(pool: &SqlitePool, movie_id: i64) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.id, g.name, g.description, g.url
        FROM genres g
        JOIN movie_genres mg ON mg.genre_id = g.id
        WHERE mg.movie_id = ?
        ORDER BY g.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    Ok(genres)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slug;

    fn new_category(name: &str, slug: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: String::new(),
            url: Slug::parse(slug).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let pool = crate::db::open_in_memory().await.unwrap();

        create_category(&pool, &new_category("Films", "films")).await.unwrap();
        let err = create_category(&pool, &new_category("Other films", "films"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
        assert_eq!(list_categories(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_by_slug() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let created = create_category(&pool, &new_category("Cartoons", "cartoons"))
            .await
            .unwrap();

        let found = get_category_by_slug(&pool, "cartoons").await.unwrap();
        assert_eq!(found, Some(created));
        assert!(get_category_by_slug(&pool, "series").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let err = create_category(&pool, &new_category("  ", "blank")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
