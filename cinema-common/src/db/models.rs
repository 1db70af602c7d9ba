//! Catalog records and the inputs used to create them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Slug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

/// A person credited on movies, as actor, director, or both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub poster: String,
    pub year: i64,
    pub country: String,
    pub world_premiere: NaiveDate,
    /// USD
    pub budget: i64,
    pub fees_in_usa: i64,
    pub fees_in_world: i64,
    pub category_id: Option<i64>,
    pub url: String,
    pub draft: bool,
}

impl Movie {
    /// Canonical public detail page of this movie
    pub fn absolute_url(&self) -> String {
        movie_detail_url(&self.url)
    }
}

/// Detail page path for a movie slug
pub fn movie_detail_url(slug: &str) -> String {
    format!("/movie/{}/", slug)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieShot {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub movie_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingStar {
    pub id: i64,
    pub value: i64,
}

/// One viewer's rating of a movie, with the star value resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub ip: String,
    pub star_id: i64,
    pub star_value: i64,
    pub movie_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub text: String,
    pub parent_id: Option<i64>,
    pub movie_id: i64,
}

// ----------------------------------------------------------------------------
// Creation inputs (back office)
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: Slug,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGenre {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: Slug,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActor {
    pub name: String,
    #[serde(default)]
    pub age: u16,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

fn default_year() -> u16 {
    2019
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default = "default_year")]
    pub year: u16,
    #[serde(default)]
    pub country: String,
    /// Today when omitted
    #[serde(default)]
    pub world_premiere: Option<NaiveDate>,
    #[serde(default)]
    pub budget: u32,
    #[serde(default)]
    pub fees_in_usa: u32,
    #[serde(default)]
    pub fees_in_world: u32,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub url: Slug,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub genres: Vec<i64>,
    #[serde(default)]
    pub directors: Vec<i64>,
    #[serde(default)]
    pub actors: Vec<i64>,
}

impl NewMovie {
    /// Minimal published movie; the rest via struct update syntax
    pub fn new(title: impl Into<String>, url: Slug) -> Self {
        Self {
            title: title.into(),
            tagline: String::new(),
            description: String::new(),
            poster: String::new(),
            year: default_year(),
            country: String::new(),
            world_premiere: None,
            budget: 0,
            fees_in_usa: 0,
            fees_in_world: 0,
            category_id: None,
            url,
            draft: false,
            genres: Vec::new(),
            directors: Vec::new(),
            actors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovieShot {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

/// Reject text longer than a column allows
pub(crate) fn check_len(field: &str, value: &str, max: usize) -> crate::Result<()> {
    if value.chars().count() > max {
        return Err(crate::Error::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Reject empty (after trimming) required text
pub(crate) fn check_required(field: &str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}
