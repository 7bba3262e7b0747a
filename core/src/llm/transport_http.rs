//! Real HTTP transport using reqwest
//!
//! One client per process, bounded request timeout. A slow or hung
//! generation backend surfaces as `GatewayError::Unavailable` instead of
//! blocking the request forever.

use crate::llm::transport_types::GatewayError;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Real HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create new transport with default timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Create transport with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self { client }
    }

    /// POST a JSON body and return the response body text
    ///
    /// Non-success statuses become `GatewayError::Http`.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        basic_auth: Option<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        let mut request = self.client.post(url).json(body);

        for (key, value) in headers {
            request = request.header(*key, *value);
        }
        if let Some((user, password)) = basic_auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(text)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
