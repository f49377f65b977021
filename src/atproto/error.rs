//! Resolution errors
//!
//! Every remote lookup below the formatter layer reports failure through
//! [`ResolveError`]. The type is `Clone` so a failed outcome can be cached
//! alongside successful ones.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The `at://` reference could not be parsed.
    #[error("malformed resource uri: {0}")]
    MalformedUri(String),

    /// DID method other than `plc` or `web`.
    #[error("unsupported did method: {0}")]
    UnsupportedDid(String),

    /// The DID document advertises no usable PDS endpoint.
    #[error("no PDS service endpoint found for {0}")]
    NoPdsEndpoint(String),

    /// Transport-level failure (connect, timeout, non-JSON body).
    #[error("http request failed: {0}")]
    Http(String),

    /// Structured XRPC error payload.
    #[error("xrpc error {error}: {}", .message.as_deref().unwrap_or("no message"))]
    Xrpc {
        error: String,
        message: Option<String>,
    },

    /// The response decoded, but not into the expected record shape.
    #[error("unexpected record shape: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        ResolveError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        ResolveError::Decode(e.to_string())
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
