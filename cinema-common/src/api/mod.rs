//! Back-office request authentication shared by the site
//!
//! Only pure functions and settings-table access live here; the axum
//! middleware that applies them is in the site crate.

pub mod auth;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, sign_document, to_canonical_json,
    validate_hash, validate_timestamp, ApiAuthError, AuthQuery, SHARED_SECRET_KEY,
};
