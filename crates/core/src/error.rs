//! Error taxonomy for backend exchanges.
//!
//! Uses `thiserror` for ergonomic error definitions. Every failure the API
//! client reports is exactly one [`ApiErrorKind`]; callers switch on the kind
//! to pick operator-facing text and never need to inspect transport errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters of a backend error body carried in a message.
pub const BACKEND_DETAIL_LIMIT: usize = 200;

/// Where in the exchange a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    /// Backend URL missing or invalid, or another required setting is unusable.
    Config,
    /// Connection could not be established or was interrupted.
    Network,
    /// The configured deadline elapsed before completion.
    Timeout,
    /// The server answered with a non-2xx status.
    Backend,
    /// The server answered 2xx but the body was missing or malformed.
    Parse,
    /// Any other I/O failure while reading a response.
    Unknown,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::Config => "CONFIG",
            ApiErrorKind::Network => "NETWORK",
            ApiErrorKind::Timeout => "TIMEOUT",
            ApiErrorKind::Backend => "BACKEND",
            ApiErrorKind::Parse => "PARSE",
            ApiErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified client failure.
///
/// `status` is only set for [`ApiErrorKind::Backend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
}

/// Result type alias for client operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Config, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    /// A non-2xx answer. The status code is carried alongside the message.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Backend,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unknown, message)
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

/// Trim a backend error body down to [`BACKEND_DETAIL_LIMIT`] characters.
///
/// Counts `char`s, not bytes, so multi-byte bodies are never split mid-codepoint.
pub fn truncate_detail(body: &str) -> String {
    body.trim().chars().take(BACKEND_DETAIL_LIMIT).collect()
}
