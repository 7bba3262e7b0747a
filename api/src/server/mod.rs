//! API Server Module
//!
//! Router construction and server startup.

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use mapspeak_core::llm::Generator;
use mapspeak_core::types::ClusterState;
use mapspeak_databases::PostgisStore;

use crate::handlers::{
    delete_saved_query, get_help, get_layer_geojson, get_layer_popup_properties,
    get_saved_queries, health_check, load_saved_query, query_map, save_query, ApiState,
};
use crate::models::ApiConfig;

/// Main API server
pub struct ApiServer {
    /// Server configuration
    config: ApiConfig,
    /// Shared state
    state: Arc<ApiState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiConfig, generator: Generator, store: PostgisStore) -> Self {
        let state = Arc::new(ApiState {
            generator,
            store,
            clusters: ClusterState::new(),
        });

        Self { config, state }
    }

    /// Start the API server
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting mapspeak API server on {}:{}",
            self.config.host, self.config.port
        );

        let app = Router::new()
            // Natural-language query pipeline
            .route("/query", get(query_map))
            .route("/help", get(get_help))
            // Saved queries
            .route("/save-query", post(save_query))
            .route("/get-saved-queries", get(get_saved_queries))
            .route("/load-saved-query/:query_id", get(load_saved_query))
            .route("/delete-saved-query/:query_id", delete(delete_saved_query))
            // Layer data for the map client
            .route("/get-layer-geojson", get(get_layer_geojson))
            .route(
                "/get-layer-popup-properties",
                get(get_layer_popup_properties),
            )
            // Health check
            .route("/health", get(health_check))
            .layer(self.cors_layer()?)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        let host: IpAddr = self
            .config
            .host
            .parse()
            .with_context(|| format!("invalid bind host: {}", self.config.host))?;
        let addr = SocketAddr::from((host, self.config.port));
        info!("mapspeak API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start API server: {}", e))?;

        Ok(())
    }

    /// CORS restricted to the configured frontend, permissive otherwise
    fn cors_layer(&self) -> Result<CorsLayer> {
        Ok(match &self.config.frontend_origin {
            Some(origin) => {
                let origin: HeaderValue = origin
                    .parse()
                    .with_context(|| format!("invalid frontend origin: {origin}"))?;
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
            None => CorsLayer::permissive(),
        })
    }
}
