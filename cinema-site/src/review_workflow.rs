//! Review submission workflow
//!
//! Turns a posted review form into at most one new review row of a movie.
//! The movie is looked up first: an unknown movie is an error whatever the
//! form holds. Field problems and a parent that does not exist do not fail
//! the call; they come back as [`Submission::Dropped`] and the caller decides
//! whether to redirect anyway or answer 422. Any existing review may be a
//! parent, including one of another movie.

use cinema_common::db::{self, Review};
use cinema_common::review_form::FieldErrors;
use cinema_common::ReviewForm;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

/// What happened to one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Stored as a new review
    Accepted(Review),
    /// Nothing stored
    Dropped(FieldErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Canonical detail page of the movie
    pub redirect_to: String,
    pub submission: Submission,
}

/// Validate `form` and store it as a review of `movie_id`
///
/// Fails only with `NotFound` for an unknown movie or with a storage error.
pub async fn submit_review(
    pool: &SqlitePool,
    movie_id: i64,
    form: &ReviewForm,
) -> ApiResult<SubmitOutcome> {
    let movie = db::movies::get_movie(pool, movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("movie {}", movie_id)))?;
    let redirect_to = movie.absolute_url();

    let submission = match form.validate() {
        Err(errors) => Submission::Dropped(errors),
        Ok(valid) => match check_parent(pool, valid.parent_id).await? {
            Some(errors) => Submission::Dropped(errors),
            None => match db::reviews::insert_review(pool, movie_id, &valid).await {
                Ok(review) => Submission::Accepted(review),
                // Parent deleted between the check and the insert
                Err(cinema_common::Error::InvalidInput(msg)) => {
                    let mut errors = FieldErrors::default();
                    errors.add("parent", msg);
                    Submission::Dropped(errors)
                }
                Err(e) => return Err(e.into()),
            },
        },
    };

    match &submission {
        Submission::Accepted(review) => info!(
            "Review {} stored for movie {} (parent {:?})",
            review.id, movie.url, review.parent_id
        ),
        Submission::Dropped(errors) => {
            warn!("Review for movie {} dropped: {}", movie.url, errors)
        }
    }

    Ok(SubmitOutcome {
        redirect_to,
        submission,
    })
}

/// `Some(errors)` when the parent is not an existing review
async fn check_parent(pool: &SqlitePool, parent_id: Option<i64>) -> ApiResult<Option<FieldErrors>> {
    let Some(parent_id) = parent_id else {
        return Ok(None);
    };

    if db::reviews::get_review(pool, parent_id).await?.is_some() {
        return Ok(None);
    }

    let mut errors = FieldErrors::default();
    errors.add("parent", format!("Review {} does not exist.", parent_id));
    Ok(Some(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinema_common::db::NewMovie;
    use cinema_common::Slug;

    fn form(name: &str, email: &str, text: &str, parent: Option<&str>) -> ReviewForm {
        ReviewForm {
            name: name.to_string(),
            email: email.to_string(),
            text: text.to_string(),
            parent: parent.map(str::to_string),
        }
    }

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = db::open_in_memory().await.unwrap();
        let up = db::movies::create_movie(&pool, &NewMovie::new("Up", Slug::parse("up").unwrap()))
            .await
            .unwrap();
        let heat = db::movies::create_movie(&pool, &NewMovie::new("Heat", Slug::parse("heat").unwrap()))
            .await
            .unwrap();
        (pool, up.id, heat.id)
    }

    #[tokio::test]
    async fn test_accepts_valid_form() {
        let (pool, up, _) = setup().await;

        let outcome = submit_review(&pool, up, &form("Ann", "ann@example.com", "Great film", None))
            .await
            .unwrap();

        assert_eq!(outcome.redirect_to, "/movie/up/");
        match outcome.submission {
            Submission::Accepted(review) => {
                assert_eq!(review.movie_id, up);
                assert_eq!(review.parent_id, None);
            }
            other => panic!("expected accepted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_movie_is_not_found_even_with_bad_form() {
        let (pool, _, _) = setup().await;

        let err = submit_review(&pool, 999, &form("", "", "", None)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_parent_of_other_movie_kept() {
        let (pool, up, heat) = setup().await;
        let outcome = submit_review(&pool, heat, &form("Ann", "ann@example.com", "Tense", None))
            .await
            .unwrap();
        let Submission::Accepted(on_heat) = outcome.submission else {
            panic!("first review should be stored");
        };

        let parent = on_heat.id.to_string();
        let outcome = submit_review(
            &pool,
            up,
            &form("Bob", "bob@example.com", "Reply", Some(parent.as_str())),
        )
        .await
        .unwrap();

        match outcome.submission {
            Submission::Accepted(reply) => {
                assert_eq!(reply.movie_id, up);
                assert_eq!(reply.parent_id, Some(on_heat.id));
            }
            other => panic!("expected accepted, got {:?}", other),
        }
        assert_eq!(outcome.redirect_to, "/movie/up/");
        assert_eq!(db::reviews::count_reviews(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_parent_dropped() {
        let (pool, up, _) = setup().await;

        let outcome = submit_review(
            &pool,
            up,
            &form("Bob", "bob@example.com", "Reply", Some("4242")),
        )
        .await
        .unwrap();

        assert!(matches!(outcome.submission, Submission::Dropped(_)));
        assert_eq!(outcome.redirect_to, "/movie/up/");
    }
}
