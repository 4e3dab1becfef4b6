//! Error types for devcost
//!
//! Library code uses `crate::error::Result<T>` which returns `DevcostError`.
//! The binary uses `anyhow::Result<T>` for top-level error handling, converting
//! at the boundary with `anyhow::Error::from`.
//!
//! ## Error kinds and HTTP mapping
//!
//! - `Validation`: bad or missing query parameters. Maps to 400 and is always
//!   raised before any upstream call.
//! - `InvalidCredentials`: the upstream rejected our credentials. Handlers map
//!   this to a 200 mock-data response with a `warning` field (demo fallback),
//!   never to an error status.
//! - `TagNotActive`: the requested tag key is not registered as a cost
//!   allocation tag. Caller-fixable precondition, maps to 400.
//! - `Aws`: any other upstream failure. Maps to 500 with the message verbatim.
//! - `Config`: configuration loading/parsing issues, fatal at startup.
//!
//! The invalid-credentials classification happens in exactly one place,
//! `DevcostError::aws`, so handlers check the variant rather than matching
//! upstream error strings themselves.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevcostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    InvalidCredentials { message: String },

    #[error("tag '{tag_key}' is not active in cost allocation tags")]
    TagNotActive { tag_key: String },

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DevcostError>;

/// Upstream error signatures that indicate rejected credentials. AWS does not
/// expose a single typed "bad credentials" error across services, so the full
/// rendered error chain is matched against these once, here.
const AUTH_FAILURE_SIGNATURES: &[&str] = &[
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "ExpiredToken",
];

impl DevcostError {
    /// Wrap an upstream AWS failure, classifying credential rejections into
    /// the `InvalidCredentials` variant. `err` should carry the full error
    /// chain (use the SDK's `DisplayErrorContext`), since the signature often
    /// lives in a source error rather than the top-level message.
    pub fn aws(operation: &str, err: impl std::fmt::Display) -> Self {
        let message = format!("{operation}: {err}");
        if AUTH_FAILURE_SIGNATURES.iter().any(|s| message.contains(s)) {
            DevcostError::InvalidCredentials { message }
        } else {
            DevcostError::Aws(message)
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DevcostError::Validation(message.into())
    }

    /// True for errors that trigger the mock-data fallback.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, DevcostError::InvalidCredentials { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_classifies_unrecognized_client() {
        let err = DevcostError::aws(
            "failed to list EC2 instances",
            "api error UnrecognizedClientException: The security token included in the request is invalid.",
        );
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_aws_classifies_expired_token() {
        let err = DevcostError::aws("describe volumes", "ExpiredTokenException: token expired");
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_aws_keeps_other_errors_transient() {
        let err = DevcostError::aws("describe volumes", "ThrottlingException: slow down");
        assert!(!err.is_auth_failure());
        assert!(err.to_string().contains("describe volumes"));
    }

    #[test]
    fn test_tag_not_active_message_contains_key() {
        let err = DevcostError::TagNotActive {
            tag_key: "team".to_string(),
        };
        assert!(err.to_string().contains("team"));
        assert!(err.to_string().contains("not active in cost allocation tags"));
    }
}
