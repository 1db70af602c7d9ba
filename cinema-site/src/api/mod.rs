//! HTTP API handlers for cinema-site

pub mod actors;
pub mod admin;
pub mod auth;
pub mod health;
pub mod movies;
pub mod reviews;

pub use actors::actor_detail;
pub use auth::auth_middleware;
pub use health::health_routes;
pub use movies::{list_categories, list_movies, movie_detail, recent_movies};
pub use reviews::submit_review;
