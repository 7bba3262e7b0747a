//! Configuration
//!
//! Environment-driven, matching how the deployment injects database and
//! backend settings. `AppConfig::from_env` is the single place that
//! reads the environment; everything downstream takes typed config.

use std::env;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which text-generation backend is active
#[derive(Debug, Clone)]
pub enum LlmConfig {
    /// Self-hosted generation server, basic auth
    Ollama {
        base_url: String,
        model: String,
        username: Option<String>,
        password: Option<String>,
    },
    /// Hosted chat-completion API
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
        api_key: String,
    },
    /// Fixture responses, no network (tests and local development)
    Stub,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS; None means any origin
    pub frontend_origin: Option<String>,
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub llm: LlmConfig,
    /// Bound on each generation call, in seconds
    pub generation_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            host: env_or("MAPSPEAK_HOST", "0.0.0.0"),
            port: parse_env("MAPSPEAK_PORT", 8000)?,
            frontend_origin: env::var("FRONTEND_URL").ok(),
        };

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => postgres_url_from_parts()?,
        };

        let llm = llm_config_from_env()?;
        let generation_timeout_secs = parse_env("MAPSPEAK_GENERATION_TIMEOUT_SECS", 30)?;

        Ok(AppConfig {
            server,
            database_url,
            llm,
            generation_timeout_secs,
        })
    }
}

/// Select and configure the generation backend
///
/// `MAPSPEAK_LLM_BACKEND` is one of `ollama` (default), `azure`, `stub`.
fn llm_config_from_env() -> Result<LlmConfig, ConfigError> {
    let backend = env_or("MAPSPEAK_LLM_BACKEND", "ollama");
    match backend.as_str() {
        "ollama" => Ok(LlmConfig::Ollama {
            base_url: require("OLLAMA_HOST")?,
            model: require("LLM_MODEL")?,
            username: env::var("OLLAMA_USERNAME").ok(),
            password: env::var("OLLAMA_PASSWORD").ok(),
        }),
        "azure" => Ok(LlmConfig::Azure {
            endpoint: require("AZURE_OPENAI_ENDPOINT")?,
            deployment: require("AZURE_OPENAI_DEPLOYMENT")?,
            api_version: env_or("AZURE_OPENAI_API_VERSION", "2024-02-15-preview"),
            api_key: require("AZURE_OPENAI_API_KEY")?,
        }),
        "stub" => Ok(LlmConfig::Stub),
        other => Err(ConfigError::Invalid {
            name: "MAPSPEAK_LLM_BACKEND",
            value: other.to_string(),
        }),
    }
}

/// Assemble a postgres URL from the discrete POSTGRES_* variables
fn postgres_url_from_parts() -> Result<String, ConfigError> {
    let user = require("POSTGRES_USER")?;
    let password = require("POSTGRES_PASSWORD")?;
    let host = require("POSTGRES_HOST")?;
    let port = env_or("POSTGRES_PORT", "5432");
    let dbname = require("POSTGRES_DB")?;
    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, dbname
    ))
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}
