//! API Models Module
//!
//! Request and response shapes for the HTTP endpoints. The `/query`
//! response keeps the `{type, ...}` envelope the map client dispatches
//! on.

use mapspeak_core::types::ActionCommand;
use serde::{Deserialize, Serialize};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Frontend origin allowed by CORS, permissive when unset
    pub frontend_origin: Option<String>,
}

/// Query string for the `/query` endpoint
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub nl_query: String,
}

/// Response envelope for `/query`
///
/// `type` tells the map client whether `action` carries a command to
/// dispatch or `response` carries text to display.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryResponse {
    Action { action: ActionCommand },
    Help { response: String },
}

/// Response for `/help`
#[derive(Debug, Serialize)]
pub struct HelpResponse {
    pub response: String,
}

/// Body for `/save-query`
#[derive(Debug, Deserialize)]
pub struct SaveQueryRequest {
    pub nl_query: String,
    pub sql_query: String,
    pub primary_layer: Option<String>,
}

/// Confirmation for save/delete operations
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Response for `/load-saved-query/:id`, the re-executed result
#[derive(Debug, Serialize)]
pub struct LoadSavedQueryResponse {
    pub ids: Vec<i64>,
    pub primary_layer: Option<String>,
    pub sql_query: String,
}

/// Query string for `/get-layer-geojson`
#[derive(Debug, Deserialize)]
pub struct LayerParams {
    pub layer: String,
}

/// Query string for `/get-layer-popup-properties`
#[derive(Debug, Deserialize)]
pub struct PopupParams {
    pub layer: String,
    pub feature_id: i64,
}
