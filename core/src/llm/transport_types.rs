//! Transport types
//!
//! Common error type shared across transport and generator
//! implementations.

/// Gateway errors
///
/// `Unavailable` and `Http` cover transport failures (the backend could
/// not be reached or answered with a non-success status); `Payload`
/// covers a reachable backend whose response carried no usable text.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network error (connection refused, timeout, DNS failure)
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// HTTP error (non-2xx status)
    #[error("generation backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Backend answered successfully but the payload had no text field
    #[error("no usable text in generation payload: {0}")]
    Payload(String),

    /// JSON error while building requests or reading payloads
    #[error("JSON error: {0}")]
    Json(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GatewayError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => GatewayError::Unavailable(err.to_string()),
        }
    }
}
