//! Shared primitives for all Rust crates in Lattice.

#![forbid(unsafe_code)]

/// Numeric identifiers shared across services.
pub mod ids;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ids::{IntegrationId, IntegrationModelId, ProjectId, WorkflowId};

/// Result type used across Lattice crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Destination path is relative or otherwise not supported.
    #[error("unsupported path: {0}")]
    UnsupportedPath(String),

    /// The signing subsystem failed to produce a verification result.
    #[error("signature verification error: {0}")]
    Verification(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, IntegrationId, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_deserialization_is_validated() {
        let parsed = serde_json::from_str::<NonEmptyString>("\"  \"");
        assert!(parsed.is_err());
    }

    #[test]
    fn numeric_ids_must_be_positive() {
        assert!(matches!(
            IntegrationId::new(0),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            IntegrationId::new(42)
                .map(|id| id.to_string())
                .unwrap_or_default(),
            "42"
        );
    }
}
