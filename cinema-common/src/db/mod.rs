//! Catalog store: schema, models and queries

pub mod actors;
pub mod categories;
pub mod init;
pub mod migrations;
pub mod models;
pub mod movies;
pub mod ratings;
pub mod reviews;
pub mod shots;

pub use init::{init_database, open_in_memory};
pub use models::*;
