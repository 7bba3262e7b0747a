//! Mapspeak API Module
//!
//! HTTP endpoints for the natural-language map backend: the query
//! endpoint that routes between the SQL and action pipelines, saved
//! query management, and the layer data pass-throughs the map client
//! loads directly.

pub mod handlers;
pub mod models;
pub mod server;

pub use handlers::*;
pub use models::*;
pub use server::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_creation() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            frontend_origin: Some("http://localhost:5173".to_string()),
        };

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
    }
}
