//! Client error type and server message extraction.

use hrdesk_core::{
    ApprovalError, ConfigError, FileError, HrdeskError, SubmissionError, ValidationError,
};
use thiserror::Error;

/// Message shown when the server gives no usable explanation.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message shown for a 403 without a body.
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";

/// Errors raised by the HTTP client and the workflows built on it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the bearer token. The session has been cleared.
    #[error("Session expired")]
    Unauthorized,

    /// The server refused the action for this user.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Message extracted from the response.
        message: String,
    },

    /// Any other non-success status.
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        /// Endpoint path.
        endpoint: String,
        /// Parse error.
        source: serde_json::Error,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// No bearer token is set.
    #[error("Not signed in")]
    NoSession,

    /// The employee profile has not been loaded yet.
    #[error("Employee profile is not loaded")]
    ProfileNotLoaded,

    /// No loaded record has this id.
    #[error("No record with id '{0}'")]
    UnknownRecord(String),

    /// A local file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A domain rule refused the operation before any request was sent.
    #[error(transparent)]
    Core(#[from] HrdeskError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

macro_rules! via_core {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ClientError {
                fn from(err: $ty) -> Self {
                    Self::Core(err.into())
                }
            }
        )*
    };
}

via_core!(
    ValidationError,
    SubmissionError,
    FileError,
    ApprovalError,
    ConfigError
);

impl ClientError {
    /// Returns `true` if the user has to sign in again.
    #[inline]
    #[must_use]
    pub const fn is_session_ending(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::NoSession)
    }

    /// Returns `true` if the request never reached the server or timed out.
    #[inline]
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the operation was refused locally.
    #[inline]
    #[must_use]
    pub const fn is_local_rejection(&self) -> bool {
        matches!(self, Self::Core(_))
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "NETWORK_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Status { .. } => "SERVER_ERROR",
            Self::Decode { .. } => "BAD_RESPONSE",
            Self::InvalidBaseUrl(_) => "INVALID_BASE_URL",
            Self::NoSession => "NO_SESSION",
            Self::ProfileNotLoaded => "PROFILE_NOT_LOADED",
            Self::UnknownRecord(_) => "UNKNOWN_RECORD",
            Self::Io { .. } => "IO_ERROR",
            Self::Core(e) => e.error_code(),
        }
    }

    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(e) if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::Transport(e) if e.is_connect() => {
                "Cannot reach the server. Check your connection.".to_string()
            }
            Self::Transport(_) | Self::Decode { .. } => GENERIC_ERROR_MESSAGE.to_string(),
            Self::Unauthorized | Self::NoSession => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::Forbidden { message } | Self::Status { message, .. } => message.clone(),
            Self::Core(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Looks for a non-empty `message` key, then `error` (either a string or an
/// object with its own `message`).
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let text = |v: &serde_json::Value| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(message) = value.get("message").and_then(text) {
        return Some(message);
    }
    match value.get("error")? {
        nested @ serde_json::Value::Object(_) => nested.get("message").and_then(text),
        other => text(other),
    }
}
