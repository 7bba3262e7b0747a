//! Ollama generator
//!
//! Self-hosted generation server behind basic auth. Uses the completion
//! endpoint (`/api/generate`) with `stream: false`; the generated text
//! comes back in the `response` field.

use crate::llm::transport::{FakeTransport, Transport};
use crate::llm::{GatewayError, TextGenerator};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Ollama generator (local HTTP API, basic auth)
#[derive(Debug)]
pub struct OllamaGenerator {
    /// Base URL (e.g., http://127.0.0.1:11434)
    base_url: String,
    /// Model name (e.g., llama3)
    model: String,
    /// Basic-auth credentials, if the server requires them
    credentials: Option<(String, String)>,
    /// HTTP transport
    transport: Transport,
}

impl OllamaGenerator {
    /// Create new Ollama generator
    pub fn new(base_url: String, model: String, credentials: Option<(String, String)>) -> Self {
        Self {
            base_url,
            model,
            credentials,
            transport: Transport::default(),
        }
    }

    /// Create generator with custom transport (for testing)
    pub fn with_transport(
        base_url: String,
        model: String,
        credentials: Option<(String, String)>,
        transport: Transport,
    ) -> Self {
        Self {
            base_url,
            model,
            credentials,
            transport,
        }
    }

    /// Create generator backed by a fixture response (for testing)
    pub fn with_fake_response(model: &str, response: &str) -> Self {
        Self::with_transport(
            "http://fake".to_string(),
            model.to_string(),
            None,
            Transport::Fake(FakeTransport::new(response)),
        )
    }

    fn completion_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    /// Build completion request body
    fn build_request(&self, prompt: &str) -> JsonValue {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        })
    }

    /// Extract generated text from the response payload
    fn extract_text(&self, raw: &str) -> Result<String, GatewayError> {
        let json: JsonValue = serde_json::from_str(raw)?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| GatewayError::Payload("missing 'response' field".to_string()))?;

        Ok(text.to_string())
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let url = self.completion_url();
        let body = self.build_request(prompt);

        let auth = self
            .credentials
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()));

        let raw = self.transport.post_json(&url, &[], auth, &body).await?;
        self.extract_text(&raw)
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_response_field() {
        let generator = OllamaGenerator::with_fake_response(
            "llama3",
            r#"{"model":"llama3","response":"FILTER","done":true}"#,
        );
        let text = generator.generate("classify this").await.unwrap();
        assert_eq!(text, "FILTER");
    }

    #[tokio::test]
    async fn test_missing_response_field_is_payload_error() {
        let generator =
            OllamaGenerator::with_fake_response("llama3", r#"{"model":"llama3","done":true}"#);
        let err = generator.generate("classify this").await.unwrap_err();
        assert!(matches!(err, GatewayError::Payload(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_immediately() {
        let generator = OllamaGenerator::with_transport(
            "http://fake".to_string(),
            "llama3".to_string(),
            None,
            Transport::Fake(FakeTransport::with_error("connection refused")),
        );
        let err = generator.generate("hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[test]
    fn test_completion_url_trims_trailing_slash() {
        let generator = OllamaGenerator::new(
            "http://127.0.0.1:11434/".to_string(),
            "llama3".to_string(),
            None,
        );
        assert_eq!(generator.completion_url(), "http://127.0.0.1:11434/api/generate");
    }

    #[test]
    fn test_request_body_is_non_streaming() {
        let generator =
            OllamaGenerator::new("http://h".to_string(), "llama3".to_string(), None);
        let body = generator.build_request("zoom in");
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["prompt"], "zoom in");
        assert_eq!(body["stream"], false);
    }
}
