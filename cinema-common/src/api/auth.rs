//! Timestamp + hash signing of back-office requests
//!
//! Every back-office request carries `timestamp` (Unix epoch milliseconds) and
//! `hash` (SHA-256, 64 hex chars). The hash covers the canonical JSON of the
//! request document with `hash` replaced by 64 zeros, followed by the shared
//! secret in decimal. A shared secret of 0 turns checking off.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

/// Settings key holding the back-office shared secret
pub const SHARED_SECRET_KEY: &str = "admin_shared_secret";

/// How far in the past a timestamp may lie
pub const MAX_PAST_MS: i64 = 1000;
/// How far in the future a timestamp may lie (clock drift only)
pub const MAX_FUTURE_MS: i64 = 1;

const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { timestamp: i64, now: i64, reason: String },

    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    #[error("Missing {0} field")]
    MissingField(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Auth fields carried in the query string of GET/DELETE requests
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthQuery {
    pub timestamp: i64,
    pub hash: String,
}

impl AuthQuery {
    /// The document a query-authenticated request is signed over
    pub fn document(&self) -> Value {
        serde_json::json!({ "timestamp": self.timestamp, "hash": self.hash })
    }
}

/// Load the shared secret, generating one on first use
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let stored: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(SHARED_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match stored.flatten() {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid shared secret: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Store a fresh random non-zero secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let secret: i64 = {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = rng.gen::<i64>();
            if candidate != 0 {
                break candidate;
            }
        }
    };

    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(SHARED_SECRET_KEY)
    .bind(secret.to_string())
    .execute(db)
    .await
    .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    tracing::info!("Generated new back-office shared secret");
    Ok(secret)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Check a request timestamp against the current clock
///
/// # Examples
///
/// ```
/// use cinema_common::api::validate_timestamp;
///
/// let now = chrono::Utc::now().timestamp_millis();
/// assert!(validate_timestamp(now - 500).is_ok());
/// assert!(validate_timestamp(now - 5000).is_err());
/// ```
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, now_millis())
}

/// Check a request timestamp against an explicit `now`
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let Some(age) = now.checked_sub(timestamp) else {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: "Timestamp out of range".to_string(),
        });
    };

    if age > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", age, MAX_PAST_MS),
        });
    }

    if age < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                age.unsigned_abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Canonical JSON: object keys sorted, no whitespace
///
/// # Examples
///
/// ```
/// use cinema_common::api::to_canonical_json;
/// use serde_json::json;
///
/// let canonical = to_canonical_json(&json!({"z": 3, "a": [1, "x"]}));
/// assert_eq!(canonical, r#"{"a":[1,"x"],"z":3}"#);
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let items: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // Scalars already serialize compactly, with proper string escaping
        scalar => scalar.to_string(),
    }
}

/// Hash of a request document under `shared_secret`
pub fn calculate_hash(document: &Value, shared_secret: i64) -> String {
    let mut document = document.clone();
    if let Some(obj) = document.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(ZERO_HASH.to_string()));
    }

    let mut hasher = Sha256::new();
    hasher.update(to_canonical_json(&document).as_bytes());
    hasher.update(shared_secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn validate_hash(
    provided: &str,
    document: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(document, shared_secret);
    if !provided.eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidHash {
            provided: provided.to_string(),
            calculated,
        });
    }
    Ok(())
}

/// Stamp `document` with the current time and its hash (client side)
///
/// Returns the signed document, ready to send as a POST body or to split
/// into query parameters.
pub fn sign_document(mut document: Value, shared_secret: i64) -> Value {
    if let Some(obj) = document.as_object_mut() {
        obj.insert("timestamp".to_string(), Value::from(now_millis()));
        obj.insert("hash".to_string(), Value::String(ZERO_HASH.to_string()));
    }
    let hash = calculate_hash(&document, shared_secret);
    if let Some(obj) = document.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(hash));
    }
    document
}
