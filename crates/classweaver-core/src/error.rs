//! Error types for the ClassWeaver client.

use thiserror::Error;

/// A shared error type for the entire client layer.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. HTTP failures are always
/// normalized into the `Http` variant so callers can branch on the status
/// code without re-parsing response bodies.
#[derive(Error, Debug, Clone)]
pub enum WeaverError {
    /// Non-2xx HTTP response, carrying the best-effort message extracted
    /// from the response body and the numeric status code.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Network-level failure (unreachable host, aborted connection).
    /// The request did not complete; no status code is available.
    #[error("request failed: {0}")]
    Transport(String),

    /// A response that claimed success but was not valid JSON.
    /// Carries the raw body text so nothing is silently swallowed.
    #[error("invalid response body: {body}")]
    InvalidBody { body: String },

    /// Local storage error (session-scoped key/value access)
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl WeaverError {
    /// Creates an Http error from a status code and message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an InvalidBody error carrying the raw response text.
    pub fn invalid_body(body: impl Into<String>) -> Self {
        Self::InvalidBody { body: body.into() }
    }

    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Check if this is a transport-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for WeaverError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization failed: {err}"))
    }
}

impl From<reqwest::Error> for WeaverError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A type alias for `Result<T, WeaverError>`.
pub type Result<T> = std::result::Result<T, WeaverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_displays_message_only() {
        let err = WeaverError::http(400, "username already taken");
        assert_eq!(err.to_string(), "username already taken");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_unauthorized_check() {
        assert!(WeaverError::http(401, "unauthorized").is_unauthorized());
        assert!(!WeaverError::http(403, "forbidden").is_unauthorized());
        assert!(!WeaverError::transport("connection refused").is_unauthorized());
    }

    #[test]
    fn test_transport_has_no_status() {
        let err = WeaverError::transport("connection refused");
        assert_eq!(err.status(), None);
        assert!(err.is_transport());
    }
}
