//! Transport enum for the generation gateway
//!
//! Wraps the real and fake transports behind one concrete type so
//! generators stay testable without trait objects.

pub use crate::llm::transport_fake::FakeTransport;
pub use crate::llm::transport_http::HttpTransport;
pub use crate::llm::transport_types::GatewayError;

/// Concrete transport enum
#[derive(Debug, Clone)]
pub enum Transport {
    Real(HttpTransport),
    Fake(FakeTransport),
}

impl Transport {
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        basic_auth: Option<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        match self {
            Transport::Real(t) => t.post_json(url, headers, basic_auth, body).await,
            Transport::Fake(t) => t.post_json(url, headers, basic_auth, body),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Transport::Real(HttpTransport::new())
    }
}
