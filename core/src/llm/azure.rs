//! Azure OpenAI generator
//!
//! Hosted chat-completion backend with a fixed deployment identity,
//! temperature, and response-length cap. The generated text comes back
//! at `choices[0].message.content`.

use crate::llm::transport::{FakeTransport, Transport};
use crate::llm::{GatewayError, TextGenerator};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Fixed sampling temperature for deterministic-ish structured output
const TEMPERATURE: f64 = 0.0;
/// Response-length cap in tokens
const MAX_TOKENS: u32 = 800;

/// Azure OpenAI chat-completion generator
#[derive(Debug)]
pub struct AzureGenerator {
    /// Resource endpoint (e.g., https://myresource.openai.azure.com)
    endpoint: String,
    /// Deployment name
    deployment: String,
    /// API version query parameter
    api_version: String,
    /// API key
    api_key: String,
    /// HTTP transport
    transport: Transport,
}

impl AzureGenerator {
    /// Create new Azure generator
    pub fn new(endpoint: String, deployment: String, api_version: String, api_key: String) -> Self {
        Self {
            endpoint,
            deployment,
            api_version,
            api_key,
            transport: Transport::default(),
        }
    }

    /// Create generator with custom transport (for testing)
    pub fn with_transport(
        endpoint: String,
        deployment: String,
        api_version: String,
        api_key: String,
        transport: Transport,
    ) -> Self {
        Self {
            endpoint,
            deployment,
            api_version,
            api_key,
            transport,
        }
    }

    /// Create generator backed by a fixture response (for testing)
    pub fn with_fake_response(response: &str) -> Self {
        Self::with_transport(
            "https://fake.openai.azure.com".to_string(),
            "gpt-4o".to_string(),
            "2024-02-15-preview".to_string(),
            "test-key".to_string(),
            Transport::Fake(FakeTransport::new(response)),
        )
    }

    fn completion_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    /// Build chat request body (single user message, no system prompt)
    fn build_request(&self, prompt: &str) -> JsonValue {
        serde_json::json!({
            "messages": [{"role": "user", "content": prompt}],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS
        })
    }

    /// Extract generated text from the chat-completion payload
    fn extract_text(&self, raw: &str) -> Result<String, GatewayError> {
        let json: JsonValue = serde_json::from_str(raw)?;

        let content = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                GatewayError::Payload("missing choices[0].message.content".to_string())
            })?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl TextGenerator for AzureGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let url = self.completion_url();
        let body = self.build_request(prompt);
        let headers = [("api-key", self.api_key.as_str())];

        let raw = self.transport.post_json(&url, &headers, None, &body).await?;
        self.extract_text(&raw)
    }

    fn provider_name(&self) -> &str {
        "azure"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_chat_message_content() {
        let generator = AzureGenerator::with_fake_response(
            r#"{"choices":[{"message":{"role":"assistant","content":"ACTION"}}]}"#,
        );
        let text = generator.generate("classify").await.unwrap();
        assert_eq!(text, "ACTION");
    }

    #[tokio::test]
    async fn test_empty_choices_is_payload_error() {
        let generator = AzureGenerator::with_fake_response(r#"{"choices":[]}"#);
        let err = generator.generate("classify").await.unwrap_err();
        assert!(matches!(err, GatewayError::Payload(_)));
    }

    #[test]
    fn test_completion_url_shape() {
        let generator = AzureGenerator::new(
            "https://myres.openai.azure.com/".to_string(),
            "gpt-4o".to_string(),
            "2024-02-15-preview".to_string(),
            "key".to_string(),
        );
        assert_eq!(
            generator.completion_url(),
            "https://myres.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_request_carries_fixed_sampling_config() {
        let generator = AzureGenerator::with_fake_response("{}");
        let body = generator.build_request("pan left");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "pan left");
    }
}
