//! Review submission form and its field constraints
//!
//! The public review form posts `name`, `email`, `text` (older templates send
//! `message`) and an optional `parent` review id. Every field is optional at
//! the extraction layer so a malformed submission still reaches the workflow,
//! which decides whether to drop it silently or report it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

/// Maximum author name length in characters
pub const MAX_NAME_LEN: u64 = 100;
/// Maximum email length in characters
pub const MAX_EMAIL_LEN: u64 = 254;
/// Maximum review text length in characters
pub const MAX_TEXT_LEN: u64 = 5000;

/// Raw review form as posted by a visitor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "message")]
    pub text: String,
    /// Parent review id as submitted (still a string; may be empty)
    #[serde(default)]
    pub parent: Option<String>,
}

/// Trimmed field values checked against the stored column constraints
#[derive(Debug, Validate)]
struct ReviewFields {
    #[validate(length(min = 1, max = 100, message = "Enter a name of at most 100 characters."))]
    name: String,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Email must be at most 254 characters.")
    )]
    email: String,
    #[validate(length(min = 1, max = 5000, message = "Enter a review of at most 5000 characters."))]
    text: String,
}

/// A review submission that passed field validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub name: String,
    pub email: String,
    pub text: String,
    pub parent_id: Option<i64>,
}

/// Field name → list of human-readable problems
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

impl ReviewForm {
    /// Check field constraints and coerce the parent id
    ///
    /// Whitespace around every field is stripped first, so a name of only
    /// spaces counts as empty. An empty or absent `parent` means "no parent".
    /// Whether the parent review exists is a storage question and is checked
    /// by the caller.
    pub fn validate(&self) -> Result<ValidReview, FieldErrors> {
        let fields = ReviewFields {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            text: self.text.trim().to_string(),
        };

        let mut errors = match fields.validate() {
            Ok(()) => FieldErrors::default(),
            Err(e) => FieldErrors::from(e),
        };

        let parent_id = match self.parent.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("parent", format!("Parent review id {:?} is not an integer.", raw));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidReview {
            name: fields.name,
            email: fields.email,
            text: fields.text,
            parent_id,
        })
    }
}
