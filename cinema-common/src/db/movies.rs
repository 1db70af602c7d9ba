//! Movie queries and draft-flag updates

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use super::models::{check_len, check_required, Movie, NewMovie};
use crate::{Error, Result};

/// Column list for `query_as::<_, Movie>` over `movies m`
pub(crate) const MOVIE_COLUMNS: &str = "m.id, m.title, m.tagline, m.description, m.poster, \
     m.year, m.country, m.world_premiere, m.budget, m.fees_in_usa, m.fees_in_world, \
     m.category_id, m.url, m.draft";

/// Back-office listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieFilter {
    /// Category slug
    pub category: Option<String>,
    pub year: Option<i64>,
    /// Case-insensitive substring of the title or the category name
    pub q: Option<String>,
}

/// Insert a movie and its genre/director/actor links atomically
pub async fn create_movie(pool: &SqlitePool, new: &NewMovie) -> Result<Movie> {
    check_required("title", &new.title)?;
    check_len("title", &new.title, 100)?;
    check_len("tagline", &new.tagline, 100)?;
    check_len("country", &new.country, 30)?;

    let premiere = new
        .world_premiere
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO movies (
            title, tagline, description, poster, year, country, world_premiere,
            budget, fees_in_usa, fees_in_world, category_id, url, draft
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.title.trim())
    .bind(&new.tagline)
    .bind(&new.description)
    .bind(&new.poster)
    .bind(new.year)
    .bind(&new.country)
    .bind(premiere)
    .bind(new.budget)
    .bind(new.fees_in_usa)
    .bind(new.fees_in_world)
    .bind(new.category_id)
    .bind(new.url.as_str())
    .bind(new.draft)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::from_write(e, &format!("movie {}", new.url)))?
    .last_insert_rowid();

    link_all(&mut tx, "movie_genres", "genre_id", id, &new.genres).await?;
    link_all(&mut tx, "movie_directors", "actor_id", id, &new.directors).await?;
    link_all(&mut tx, "movie_actors", "actor_id", id, &new.actors).await?;

    tx.commit().await?;

    get_movie(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("movie {} vanished after insert", id)))
}

async fn link_all(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    column: &str,
    movie_id: i64,
    targets: &[i64],
) -> Result<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (movie_id, {}) VALUES (?, ?)",
        table, column
    );
    for target in targets {
        sqlx::query(&sql)
            .bind(movie_id)
            .bind(target)
            .execute(&mut **tx)
            .await
            .map_err(|e| Error::from_write(e, &format!("{} {}", column, target)))?;
    }
    Ok(())
}

pub async fn get_movie(pool: &SqlitePool, id: i64) -> Result<Option<Movie>> {
    let sql = format!("SELECT {} FROM movies m WHERE m.id = ?", MOVIE_COLUMNS);
    let movie = sqlx::query_as::<_, Movie>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(movie)
}

/// Detail-page lookup; drafts are returned too
pub async fn get_movie_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Movie>> {
    let sql = format!("SELECT {} FROM movies m WHERE m.url = ?", MOVIE_COLUMNS);
    let movie = sqlx::query_as::<_, Movie>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(movie)
}

pub async fn count_published(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE draft = 0")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// One page of published movies, oldest first
pub async fn list_published(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Movie>> {
    let sql = format!(
        "SELECT {} FROM movies m WHERE m.draft = 0 ORDER BY m.id LIMIT ? OFFSET ?",
        MOVIE_COLUMNS
    );
    let movies = sqlx::query_as::<_, Movie>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(movies)
}

/// The `count` most recently added published movies, newest first
pub async fn recent_published(pool: &SqlitePool, count: i64) -> Result<Vec<Movie>> {
    let sql = format!(
        "SELECT {} FROM movies m WHERE m.draft = 0 ORDER BY m.id DESC LIMIT ?",
        MOVIE_COLUMNS
    );
    let movies = sqlx::query_as::<_, Movie>(&sql)
        .bind(count.max(0))
        .fetch_all(pool)
        .await?;

    Ok(movies)
}

/// Back-office listing, drafts included, newest first
pub async fn search_movies(pool: &SqlitePool, filter: &MovieFilter) -> Result<Vec<Movie>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM movies m LEFT JOIN categories c ON c.id = m.category_id WHERE 1 = 1",
        MOVIE_COLUMNS
    ));

    if let Some(slug) = filter.category.as_deref().filter(|s| !s.is_empty()) {
        query.push(" AND c.url = ").push_bind(slug.to_string());
    }
    if let Some(year) = filter.year {
        query.push(" AND m.year = ").push_bind(year);
    }
    if let Some(term) = filter.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query
            .push(" AND (instr(lower(m.title), lower(")
            .push_bind(term.to_string())
            .push(")) > 0 OR instr(lower(coalesce(c.name, '')), lower(")
            .push_bind(term.to_string())
            .push(")) > 0)");
    }
    query.push(" ORDER BY m.id DESC");

    let movies = query.build_query_as::<Movie>().fetch_all(pool).await?;
    Ok(movies)
}

/// Set the draft flag on one movie; `false` if it does not exist
pub async fn set_draft(pool: &SqlitePool, id: i64, draft: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE movies SET draft = ? WHERE id = ?")
        .bind(draft)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Ids bound per `UPDATE`, well under SQLite's host parameter limit
const BULK_CHUNK: usize = 500;

/// Set the draft flag across a selection; returns the number of rows matched
///
/// Large selections are updated in chunks inside one transaction. Repeated
/// ids count once.
pub async fn set_draft_bulk(pool: &SqlitePool, ids: &[i64], draft: bool) -> Result<u64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut matched = 0;
    for chunk in ids.chunks(BULK_CHUNK) {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE movies SET draft = ");
        query.push_bind(draft).push(" WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        matched += query.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::categories::create_category;
    use crate::db::models::NewCategory;
    use crate::Slug;

    async fn movie(pool: &SqlitePool, title: &str, slug: &str, draft: bool) -> Movie {
        create_movie(
            pool,
            &NewMovie {
                draft,
                ..NewMovie::new(title, Slug::parse(slug).unwrap())
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let created = movie(&pool, "Inception", "inception", false).await;

        assert_eq!(created.year, 2019);
        assert!(!created.draft);
        assert_eq!(created.absolute_url(), "/movie/inception/");
        assert_eq!(get_movie_by_slug(&pool, "inception").await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let pool = crate::db::open_in_memory().await.unwrap();
        movie(&pool, "Inception", "inception", false).await;

        let err = create_movie(&pool, &NewMovie::new("Again", Slug::parse("inception").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_link_rolls_back_movie() {
        let pool = crate::db::open_in_memory().await.unwrap();

        let err = create_movie(
            &pool,
            &NewMovie {
                genres: vec![404],
                ..NewMovie::new("Orphan", Slug::parse("orphan").unwrap())
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
        assert!(get_movie_by_slug(&pool, "orphan").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_published_listing_and_recent() {
        let pool = crate::db::open_in_memory().await.unwrap();
        movie(&pool, "One", "one", false).await;
        movie(&pool, "Two", "two", true).await;
        movie(&pool, "Three", "three", false).await;
        movie(&pool, "Four", "four", false).await;

        assert_eq!(count_published(&pool).await.unwrap(), 3);

        let page: Vec<String> = list_published(&pool, 2, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.url)
            .collect();
        assert_eq!(page, vec!["one", "three"]);

        let recent: Vec<String> = recent_published(&pool, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.url)
            .collect();
        assert_eq!(recent, vec!["four", "three"]);
    }

    #[tokio::test]
    async fn test_bulk_draft_counts_matched_rows() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let a = movie(&pool, "A", "a", false).await;
        let b = movie(&pool, "B", "b", false).await;

        assert_eq!(set_draft_bulk(&pool, &[a.id, b.id, 999], true).await.unwrap(), 2);
        assert_eq!(count_published(&pool).await.unwrap(), 0);

        assert_eq!(set_draft_bulk(&pool, &[b.id], false).await.unwrap(), 1);
        assert_eq!(set_draft_bulk(&pool, &[], false).await.unwrap(), 0);
        assert_eq!(count_published(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bulk_draft_large_selection() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let a = movie(&pool, "Alien", "alien", false).await;
        let b = movie(&pool, "Brazil", "brazil", false).await;

        let mut ids: Vec<i64> = (10_000..50_000).collect();
        ids.push(a.id);
        ids.push(b.id);
        ids.push(a.id);

        assert_eq!(set_draft_bulk(&pool, &ids, true).await.unwrap(), 2);
        assert_eq!(count_published(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_filters() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let films = create_category(
            &pool,
            &NewCategory {
                name: "Feature Films".to_string(),
                description: String::new(),
                url: Slug::parse("films").unwrap(),
            },
        )
        .await
        .unwrap();

        create_movie(
            &pool,
            &NewMovie {
                category_id: Some(films.id),
                year: 2010,
                ..NewMovie::new("Inception", Slug::parse("inception").unwrap())
            },
        )
        .await
        .unwrap();
        movie(&pool, "Up", "up", true).await;

        let by_category = search_movies(
            &pool,
            &MovieFilter {
                category: Some("films".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_category.len(), 1);

        let by_category_name = search_movies(
            &pool,
            &MovieFilter {
                q: Some("feature".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_category_name[0].url, "inception");

        let by_year = search_movies(
            &pool,
            &MovieFilter {
                year: Some(2019),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_year.len(), 1);
        assert!(by_year[0].draft, "drafts are listed in the back office");
    }
}
