//! Generator factory
//!
//! Creates the configured generation backend. Exactly one backend is
//! active per process; selection happens once at startup, not at call
//! sites.

use crate::config::LlmConfig;
use crate::llm::azure::AzureGenerator;
use crate::llm::ollama::OllamaGenerator;
use crate::llm::stub::StubGenerator;
use crate::llm::transport::{HttpTransport, Transport};
use crate::llm::Generator;

/// Create a generator from configuration
pub fn create_generator(config: &LlmConfig, timeout_secs: u64) -> Generator {
    let transport = Transport::Real(HttpTransport::with_timeout(timeout_secs));

    match config {
        LlmConfig::Ollama {
            base_url,
            model,
            username,
            password,
        } => {
            let credentials = match (username, password) {
                (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
                _ => None,
            };
            Generator::Ollama(OllamaGenerator::with_transport(
                base_url.clone(),
                model.clone(),
                credentials,
                transport,
            ))
        }
        LlmConfig::Azure {
            endpoint,
            deployment,
            api_version,
            api_key,
        } => Generator::Azure(AzureGenerator::with_transport(
            endpoint.clone(),
            deployment.clone(),
            api_version.clone(),
            api_key.clone(),
            transport,
        )),
        LlmConfig::Stub => Generator::Stub(StubGenerator::new()),
    }
}
