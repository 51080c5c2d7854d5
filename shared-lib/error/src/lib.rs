//! Common error types for the token service.
//!
//! Errors are layered: the codec reports [`TokenError`], the credential store
//! reports [`StoreError`], and the service boundary collapses both into
//! [`AuthError`], which is what clients get to see.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of the token codec.
///
/// These distinctions are kept for logging and diagnostics only. The access
/// gate turns all of them into [`AuthError::Unauthorized`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid signature")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Token creation failed: {0}")]
    CreationFailed(String),
}

impl TokenError {
    /// Short machine-readable name of the failure.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "Malformed",
            TokenError::SignatureInvalid => "SignatureInvalid",
            TokenError::Expired => "Expired",
            TokenError::CreationFailed(_) => "CreationFailed",
        }
    }
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Authentication-related errors, as exposed past the service boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Account not found")]
    NotFound,

    #[error("Token creation failed")]
    TokenCreationFailed,

    #[error("Credential store unavailable")]
    StoreUnavailable,
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(_) => AuthError::DuplicateUsername,
            StoreError::Hashing(_) | StoreError::Unavailable(_) => AuthError::StoreUnavailable,
        }
    }
}

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Signing secret is missing or empty")]
    MissingSecret,

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid token TTL: {0}")]
    InvalidTtl(String),

    #[error("Invalid setting {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&AuthError> for ErrorResponse {
    fn from(err: &AuthError) -> Self {
        let (code, message) = match err {
            AuthError::MissingField(_) => ("AUTH_MISSING_FIELD", "All fields are required"),
            AuthError::DuplicateUsername => ("AUTH_DUPLICATE_USERNAME", "Username already exists"),
            AuthError::InvalidCredentials => ("AUTH_INVALID_CREDENTIALS", "Invalid credentials"),
            AuthError::Unauthorized => ("AUTH_UNAUTHORIZED", "Invalid or expired token"),
            AuthError::NotFound => ("AUTH_NOT_FOUND", "User not found"),
            AuthError::TokenCreationFailed | AuthError::StoreUnavailable => {
                ("SERVER_ERROR", "Server error")
            }
        };
        let response = Self::new(code, message);
        match err {
            AuthError::MissingField(field) => response.with_details(*field),
            _ => response,
        }
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        Self::from(&err)
    }
}
