//! # Cinema Common Library
//!
//! Shared code for the cinema catalog site:
//! - Catalog store (SQLite schema, models and queries)
//! - Review form validation
//! - Back-office request authentication primitives
//! - Bootstrap configuration and root folder resolution
//! - Common error type

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod review_form;
pub mod slug;

pub use error::{Error, Result};
pub use review_form::{ReviewForm, ValidReview};
pub use slug::Slug;
