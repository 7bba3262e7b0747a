//! Stub generator
//!
//! Testing generator that returns fixture responses without network
//! calls. Queued responses are consumed in order; once the queue is
//! empty the default response repeats.

use crate::llm::{GatewayError, TextGenerator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Stub generator for testing (returns fixture responses)
#[derive(Debug)]
pub struct StubGenerator {
    /// Queued responses, consumed front-first
    queue: Mutex<VecDeque<String>>,
    /// Response returned once the queue is exhausted
    default: String,
}

impl StubGenerator {
    /// Create new stub generator with a default fixture response
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: r#"{"intent":"RESET_VIEW","parameters":{}}"#.to_string(),
        }
    }

    /// Create stub generator with one fixed response
    pub fn with_response(response: &str) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: response.to_string(),
        }
    }

    /// Create stub generator that replies with the given responses in order
    ///
    /// The last response repeats after the queue drains.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue: VecDeque<String> = responses.into_iter().map(Into::into).collect();
        let default = queue
            .pop_back()
            .unwrap_or_else(|| r#"{"intent":"RESET_VIEW","parameters":{}}"#.to_string());
        Self {
            queue: Mutex::new(queue),
            default,
        }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GatewayError> {
        let mut queue = self.queue.lock().expect("stub queue lock poisoned");
        Ok(queue.pop_front().unwrap_or_else(|| self.default.clone()))
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_returns_fixed_response() {
        let stub = StubGenerator::with_response("FILTER");
        assert_eq!(stub.generate("anything").await.unwrap(), "FILTER");
        assert_eq!(stub.generate("again").await.unwrap(), "FILTER");
    }

    #[tokio::test]
    async fn test_stub_queue_consumed_in_order() {
        let stub = StubGenerator::with_responses(["first", "second", "last"]);
        assert_eq!(stub.generate("a").await.unwrap(), "first");
        assert_eq!(stub.generate("b").await.unwrap(), "second");
        assert_eq!(stub.generate("c").await.unwrap(), "last");
        // last response repeats
        assert_eq!(stub.generate("d").await.unwrap(), "last");
    }

    #[test]
    fn test_stub_provider_name() {
        assert_eq!(StubGenerator::new().provider_name(), "stub");
    }
}
