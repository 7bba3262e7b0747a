//! Text-generation gateway
//!
//! Provider-agnostic interface to the text-generation backend. Exactly
//! one backend is active per deployment, selected by configuration.
//! A single failed call surfaces immediately; there are no retries.

pub mod azure;
pub mod factory;
pub mod ollama;
pub mod stub;
pub mod transport;
pub mod transport_fake;
pub mod transport_http;
pub mod transport_types;

pub use factory::create_generator;
pub use transport::Transport;
pub use transport_fake::FakeTransport;
pub use transport_http::HttpTransport;
pub use transport_types::GatewayError;

use async_trait::async_trait;

/// Uniform generation contract
///
/// All backends implement this trait. Pipelines call generators through
/// this interface and never see provider-specific payload shapes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Turn a prompt into raw generated text
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Concrete generator type covering all backends
///
/// Keeps call sites free of trait objects; variants delegate.
#[derive(Debug)]
pub enum Generator {
    Ollama(ollama::OllamaGenerator),
    Azure(azure::AzureGenerator),
    Stub(stub::StubGenerator),
}

#[async_trait]
impl TextGenerator for Generator {
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        match self {
            Generator::Ollama(g) => g.generate(prompt).await,
            Generator::Azure(g) => g.generate(prompt).await,
            Generator::Stub(g) => g.generate(prompt).await,
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            Generator::Ollama(g) => g.provider_name(),
            Generator::Azure(g) => g.provider_name(),
            Generator::Stub(g) => g.provider_name(),
        }
    }
}
