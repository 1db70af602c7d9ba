//! Visitor reviews and their reply threads
//!
//! A review may point at a parent review. The store does not limit depth;
//! pages show one level of replies, so [`build_thread`] hangs every
//! descendant under its top-level ancestor.

use serde::Serialize;
use std::collections::HashMap;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::Review;
use crate::review_form::ValidReview;
use crate::{Error, Result};

/// Public view of a review; the author's email stays in the back office
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicReview {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub parent_id: Option<i64>,
}

impl From<Review> for PublicReview {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            name: review.name,
            text: review.text,
            parent_id: review.parent_id,
        }
    }
}

/// A top-level review with every review below it, in id order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewThread {
    #[serde(flatten)]
    pub review: PublicReview,
    pub replies: Vec<PublicReview>,
}

/// Insert one review row for `movie_id`
///
/// The caller has validated the fields and checked the parent; a parent
/// that disappeared in between surfaces as [`Error::InvalidInput`].
pub async fn insert_review(pool: &SqlitePool, movie_id: i64, review: &ValidReview) -> Result<Review> {
    let id = sqlx::query(
        "INSERT INTO reviews (email, name, text, parent_id, movie_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&review.email)
    .bind(&review.name)
    .bind(&review.text)
    .bind(review.parent_id)
    .bind(movie_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from_write(e, "review"))?
    .last_insert_rowid();

    get_review(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("review {} vanished after insert", id)))
}

pub async fn get_review(pool: &SqlitePool, id: i64) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(
        "SELECT id, name, email, text, parent_id, movie_id FROM reviews WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(review)
}

/// All reviews of a movie in insertion order
pub async fn reviews_for_movie(pool: &SqlitePool, movie_id: i64) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT id, name, email, text, parent_id, movie_id FROM reviews WHERE movie_id = ? ORDER BY id",
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    Ok(reviews)
}

/// Back-office listing, newest first, optionally for one movie
pub async fn list_reviews(pool: &SqlitePool, movie_id: Option<i64>) -> Result<Vec<Review>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, name, email, text, parent_id, movie_id FROM reviews");
    if let Some(movie_id) = movie_id {
        query.push(" WHERE movie_id = ").push_bind(movie_id);
    }
    query.push(" ORDER BY id DESC");

    let reviews = query.build_query_as::<Review>().fetch_all(pool).await?;
    Ok(reviews)
}

pub async fn count_reviews(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Replace a review's text; name and email stay as submitted
pub async fn update_review_text(pool: &SqlitePool, id: i64, text: &str) -> Result<Review> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidInput("text is required".to_string()));
    }
    if text.chars().count() > crate::review_form::MAX_TEXT_LEN as usize {
        return Err(Error::InvalidInput(format!(
            "text must be at most {} characters",
            crate::review_form::MAX_TEXT_LEN
        )));
    }

    let result = sqlx::query("UPDATE reviews SET text = ? WHERE id = ?")
        .bind(text)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("review {}", id)));
    }

    get_review(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("review {}", id)))
}

/// Delete a review; its replies stay, detached from it
pub async fn delete_review(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Arrange a movie's reviews into one-level threads
///
/// Roots are reviews without a parent, or whose parent is not among
/// `reviews`. Any deeper reply is listed under its root. Roots and replies
/// keep the input order.
pub fn build_thread(reviews: Vec<Review>) -> Vec<ReviewThread> {
    let parents: HashMap<i64, Option<i64>> =
        reviews.iter().map(|r| (r.id, r.parent_id)).collect();

    // Top-level ancestor of every review, filled in while walking up; a
    // parent cycle stops after visiting every review once
    let mut roots: HashMap<i64, i64> = HashMap::with_capacity(parents.len());
    for review in &reviews {
        let mut path = Vec::new();
        let mut current = review.id;
        let root = loop {
            if let Some(&root) = roots.get(&current) {
                break root;
            }
            if path.len() > parents.len() {
                break current;
            }
            path.push(current);
            match parents.get(&current).copied().flatten() {
                Some(parent) if parents.contains_key(&parent) => current = parent,
                _ => break current,
            }
        };
        for id in path {
            roots.insert(id, root);
        }
    }

    let mut threads: Vec<ReviewThread> = Vec::new();
    let mut position: HashMap<i64, usize> = HashMap::new();
    let mut replies: Vec<(i64, Review)> = Vec::new();

    for review in reviews {
        let root = roots.get(&review.id).copied().unwrap_or(review.id);
        if root == review.id {
            position.insert(review.id, threads.len());
            threads.push(ReviewThread {
                review: review.into(),
                replies: Vec::new(),
            });
        } else {
            replies.push((root, review));
        }
    }

    for (root, review) in replies {
        match position.get(&root) {
            Some(&index) => threads[index].replies.push(review.into()),
            None => {
                position.insert(review.id, threads.len());
                threads.push(ReviewThread {
                    review: review.into(),
                    replies: Vec::new(),
                });
            }
        }
    }

    threads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewMovie;
    use crate::db::movies::create_movie;
    use crate::Slug;

    fn review(id: i64, parent_id: Option<i64>) -> Review {
        Review {
            id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            text: "text".to_string(),
            parent_id,
            movie_id: 1,
        }
    }

    fn valid(name: &str, parent_id: Option<i64>) -> ValidReview {
        ValidReview {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            text: "Great film".to_string(),
            parent_id,
        }
    }

    #[test]
    fn test_thread_two_levels() {
        let tree = build_thread(vec![
            review(1, None),
            review(2, Some(1)),
            review(3, None),
            review(4, Some(1)),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].review.id, 1);
        let reply_ids: Vec<i64> = tree[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![2, 4]);
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn test_thread_deeper_replies_flattened_under_root() {
        let tree = build_thread(vec![review(1, None), review(2, Some(1)), review(3, Some(2))]);
        assert_eq!(tree.len(), 1);
        let reply_ids: Vec<i64> = tree[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![2, 3]);
        assert_eq!(tree[0].replies[1].parent_id, Some(2));
    }

    #[test]
    fn test_thread_long_reply_chain() {
        let depth = 50_000;
        let chain: Vec<Review> = (1..=depth)
            .map(|id| review(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();

        let tree = build_thread(chain);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].replies.len(), (depth - 1) as usize);
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("\"replies\""));
    }

    #[test]
    fn test_thread_has_no_email() {
        let tree = build_thread(vec![review(1, None), review(2, Some(1))]);
        let json = serde_json::to_value(&tree).unwrap();
        assert!(json[0].get("email").is_none());
        assert!(json[0]["replies"][0].get("email").is_none());
    }

    #[test]
    fn test_thread_unknown_parent_becomes_root() {
        let tree = build_thread(vec![review(5, Some(99))]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].review.id, 5);
    }

    #[tokio::test]
    async fn test_insert_and_reply() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let movie = create_movie(&pool, &NewMovie::new("Inception", Slug::parse("inception").unwrap()))
            .await
            .unwrap();

        let first = insert_review(&pool, movie.id, &valid("Ann", None)).await.unwrap();
        assert_eq!(first.parent_id, None);
        assert_eq!(first.movie_id, movie.id);

        let reply = insert_review(&pool, movie.id, &valid("Bob", Some(first.id)))
            .await
            .unwrap();
        assert_eq!(reply.parent_id, Some(first.id));

        assert_eq!(reviews_for_movie(&pool, movie.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_with_missing_parent_rejected() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let movie = create_movie(&pool, &NewMovie::new("Up", Slug::parse("up").unwrap()))
            .await
            .unwrap();

        let err = insert_review(&pool, movie.id, &valid("Ann", Some(12345)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(count_reviews(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_parent_detaches_replies() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let movie = create_movie(&pool, &NewMovie::new("Up", Slug::parse("up").unwrap()))
            .await
            .unwrap();
        let parent = insert_review(&pool, movie.id, &valid("Ann", None)).await.unwrap();
        let child = insert_review(&pool, movie.id, &valid("Bob", Some(parent.id)))
            .await
            .unwrap();

        assert!(delete_review(&pool, parent.id).await.unwrap());

        let child = get_review(&pool, child.id).await.unwrap().unwrap();
        assert_eq!(child.parent_id, None);
    }

    #[tokio::test]
    async fn test_update_text_keeps_author() {
        let pool = crate::db::open_in_memory().await.unwrap();
        let movie = create_movie(&pool, &NewMovie::new("Up", Slug::parse("up").unwrap()))
            .await
            .unwrap();
        let original = insert_review(&pool, movie.id, &valid("Ann", None)).await.unwrap();

        let edited = update_review_text(&pool, original.id, "Edited by staff").await.unwrap();
        assert_eq!(edited.text, "Edited by staff");
        assert_eq!(edited.name, original.name);
        assert_eq!(edited.email, original.email);

        let missing = update_review_text(&pool, 999, "x").await.unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));
    }
}
