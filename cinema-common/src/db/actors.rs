//! Actors and directors
//!
//! One `actors` table backs both roles; `movie_actors` and `movie_directors`
//! say which role a person plays on which movie.

use sqlx::SqlitePool;

use super::models::{check_len, check_required, Actor, Movie, NewActor};
use super::movies::MOVIE_COLUMNS;
use crate::{Error, Result};

/// Role of a person on a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credit {
    Actor,
    Director,
}

impl Credit {
    fn table(self) -> &'static str {
        match self {
            Credit::Actor => "movie_actors",
            Credit::Director => "movie_directors",
        }
    }
}

pub async fn create_actor(pool: &SqlitePool, new: &NewActor) -> Result<Actor> {
    check_required("name", &new.name)?;
    check_len("name", &new.name, 100)?;

    let id = sqlx::query("INSERT INTO actors (name, age, description, image) VALUES (?, ?, ?, ?)")
        .bind(new.name.trim())
        .bind(new.age)
        .bind(&new.description)
        .bind(&new.image)
        .execute(pool)
        .await
        .map_err(|e| Error::from_write(e, "actor"))?
        .last_insert_rowid();

    get_actor(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("actor {} vanished after insert", id)))
}

pub async fn get_actor(pool: &SqlitePool, id: i64) -> Result<Option<Actor>> {
    let actor = sqlx::query_as::<_, Actor>(
        "SELECT id, name, age, description, image FROM actors WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(actor)
}

/// Actor pages are addressed by exact name; the lowest id wins on duplicates
pub async fn get_actor_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Actor>> {
    let actor = sqlx::query_as::<_, Actor>(
        "SELECT id, name, age, description, image FROM actors WHERE name = ? ORDER BY id LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(actor)
}

/// People credited on a movie in the given role
pub async fn credited_on(pool: &SqlitePool, movie_id: i64, credit: Credit) -> Result<Vec<Actor>> {
    let sql = format!(
        r#"
        SELECT a.id, a.name, a.age, a.description, a.image
        FROM actors a
        JOIN {} link ON link.actor_id = a.id
        WHERE link.movie_id = ?
        ORDER BY a.id
        "#,
        credit.table()
    );

    let actors = sqlx::query_as::<_, Actor>(&sql)
        .bind(movie_id)
        .fetch_all(pool)
        .await?;

    Ok(actors)
}

/// Published movies crediting a person in the given role
pub async fn filmography(pool: &SqlitePool, actor_id: i64, credit: Credit) -> Result<Vec<Movie>> {
    let sql = format!(
        r#"
        SELECT {columns}
        FROM movies m
        JOIN {table} link ON link.movie_id = m.id
        WHERE link.actor_id = ? AND m.draft = 0
        ORDER BY m.id
        "#,
        columns = MOVIE_COLUMNS,
        table = credit.table()
    );

    let movies = sqlx::query_as::<_, Movie>(&sql)
        .bind(actor_id)
        .fetch_all(pool)
        .await?;

    Ok(movies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewMovie;
    use crate::db::movies::create_movie;
    use crate::Slug;

    fn person(name: &str) -> NewActor {
        NewActor {
            name: name.to_string(),
            age: 50,
            description: String::new(),
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn test_one_person_two_roles() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let nolan = create_actor(&pool, &person("Christopher Nolan")).await.unwrap();
        let caine = create_actor(&pool, &person("Michael Caine")).await.unwrap();

        let movie = create_movie(
            &pool,
            &NewMovie {
                directors: vec![nolan.id],
                actors: vec![caine.id, nolan.id],
                ..NewMovie::new("Inception", Slug::parse("inception").unwrap())
            },
        )
        .await
        .unwrap();

        let directors = credited_on(&pool, movie.id, Credit::Director).await.unwrap();
        let actors = credited_on(&pool, movie.id, Credit::Actor).await.unwrap();
        assert_eq!(directors, vec![nolan.clone()]);
        assert_eq!(actors.len(), 2);

        assert_eq!(filmography(&pool, nolan.id, Credit::Director).await.unwrap().len(), 1);
        assert_eq!(filmography(&pool, caine.id, Credit::Director).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_filmography_hides_drafts() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let actor = create_actor(&pool, &person("Tom Hardy")).await.unwrap();

        create_movie(
            &pool,
            &NewMovie {
                actors: vec![actor.id],
                draft: true,
                ..NewMovie::new("Unreleased", Slug::parse("unreleased").unwrap())
            },
        )
        .await
        .unwrap();

        assert!(filmography(&pool, actor.id, Credit::Actor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let created = create_actor(&pool, &person("Ellen Page")).await.unwrap();

        assert_eq!(get_actor_by_name(&pool, "Ellen Page").await.unwrap(), Some(created));
        assert!(get_actor_by_name(&pool, "ellen page").await.unwrap().is_none());
    }
}
