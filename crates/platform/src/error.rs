//! Error types for platform operations.
//!
//! Errors are categorized so callers can tell a fatal authorization problem
//! (stop the whole run) from a failed remote operation (skip the current
//! step and keep going).

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of platform errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials missing, unreadable or rejected.
    Authorization,
    /// The platform refused or failed an operation.
    Remote,
    /// The request never got a response.
    Network,
    /// The platform answered with something we could not decode.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this category halts the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authorization)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Authorization => "Not authorized",
            Self::Remote => "Remote operation failed",
            Self::Network => "Network connectivity issue",
            Self::Format => "Unexpected response from the platform",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Authorization => {
                "Write your account email and API key, one per line, to the credentials file"
            }
            Self::Remote => "Check the message from the platform and fix the desired state",
            Self::Network => "Check your internet connection and try again",
            Self::Format => "The platform API may have changed, check the API URL",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during platform operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No credentials file.
    #[error(
        "platform credentials not found at {}. Create it with your account email on the first line and your API key on the second, then try again",
        .path.display()
    )]
    CredentialsMissing {
        /// Where the credentials were expected.
        path: PathBuf,
    },

    /// Credentials file exists but is unusable.
    #[error("invalid credentials file {}: {message}", .path.display())]
    CredentialsInvalid {
        /// Credentials file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// The platform rejected the credentials.
    #[error("authorization failed: {message}")]
    Authorization {
        /// Why authorization failed.
        message: String,
    },

    /// A platform API call returned an error.
    #[error("{operation} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    RemoteOperation {
        /// Operation that failed, e.g. `add_addon`.
        operation: String,
        /// HTTP status code if available.
        status: Option<u16>,
        /// Error payload from the platform.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

/// Error body returned by the platform API.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    id: Option<String>,
    message: String,
}

impl Error {
    /// Create a remote operation error from a raw response body.
    ///
    /// JSON error payloads are reduced to their message; anything else is
    /// kept verbatim.
    pub fn remote(operation: impl Into<String>, status: Option<u16>, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiError>(body) {
            Ok(ApiError { id: Some(id), message }) => format!("{message} [{id}]"),
            Ok(ApiError { id: None, message }) => message,
            Err(_) if body.trim().is_empty() => "no response body".to_string(),
            Err(_) => body.trim().to_string(),
        };

        Self::RemoteOperation {
            operation: operation.into(),
            status,
            message,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::CredentialsMissing { .. }
            | Error::CredentialsInvalid { .. }
            | Error::Authorization { .. } => ErrorCategory::Authorization,
            Error::RemoteOperation { .. } => ErrorCategory::Remote,
            Error::Http { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error halts the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
