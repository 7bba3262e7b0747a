//! Fake transport for testing
//!
//! Uses fixture strings instead of real HTTP calls.

use crate::llm::transport_types::GatewayError;

/// Fake transport for testing (uses fixture strings)
#[derive(Debug, Clone)]
pub struct FakeTransport {
    /// Response body to return
    pub response_body: String,
    /// HTTP status to fail with (if set)
    pub error_status: Option<u16>,
    /// Network error message to return (if set)
    pub error_message: Option<String>,
}

impl FakeTransport {
    /// Create fake transport with given response body
    pub fn new(response: &str) -> Self {
        Self {
            response_body: response.to_string(),
            error_status: None,
            error_message: None,
        }
    }

    /// Create fake transport that fails with an HTTP status
    pub fn with_status(status: u16, body: &str) -> Self {
        Self {
            response_body: body.to_string(),
            error_status: Some(status),
            error_message: None,
        }
    }

    /// Create fake transport that returns a network error
    pub fn with_error(msg: &str) -> Self {
        Self {
            response_body: String::new(),
            error_status: None,
            error_message: Some(msg.to_string()),
        }
    }

    pub fn post_json(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _basic_auth: Option<(&str, &str)>,
        _body: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        if let Some(ref msg) = self.error_message {
            return Err(GatewayError::Unavailable(msg.clone()));
        }
        if let Some(status) = self.error_status {
            return Err(GatewayError::Http {
                status,
                message: self.response_body.clone(),
            });
        }
        Ok(self.response_body.clone())
    }
}
