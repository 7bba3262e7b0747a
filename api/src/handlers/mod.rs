//! API Handlers Module
//!
//! Request handlers for the query endpoint, saved queries, and the
//! layer data pass-throughs.

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use mapspeak_core::llm::Generator;
use mapspeak_core::prompts::help_text;
use mapspeak_core::store::{SavedQueryStore, SpatialStore, StoreError};
use mapspeak_core::types::{ActionCommand, ClusterState, Intent, SavedQuerySummary};
use mapspeak_core::{route_intent, run_action, run_filter, PipelineError};
use mapspeak_databases::PostgisStore;

use crate::models::{
    HelpResponse, LayerParams, LoadSavedQueryResponse, MessageResponse, PopupParams, QueryParams,
    QueryResponse, SaveQueryRequest,
};

/// Shared state of the API server
pub struct ApiState {
    /// Text-generation gateway
    pub generator: Generator,
    /// PostGIS-backed store
    pub store: PostgisStore,
    /// Advisory cluster overlay state, one per server lifecycle
    pub clusters: ClusterState,
}

/// Health check endpoint
#[debug_handler]
pub async fn health_check() -> Json<HashMap<String, String>> {
    let mut response = HashMap::new();
    response.insert("status".to_string(), "healthy".to_string());
    response.insert("service".to_string(), "mapspeak-api".to_string());
    Json(response)
}

/// Natural-language query endpoint
///
/// Classifies the query and dispatches to the SQL pipeline, the action
/// pipeline, or the static help text.
#[debug_handler]
pub async fn query_map(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let nl_query = params.nl_query;
    let intent = route_intent(&state.generator, &nl_query).await;
    tracing::info!(intent = intent.as_str(), query = %nl_query, "routing query");

    match intent {
        Intent::Filter => {
            let outcome = run_filter(&state.generator, &state.store, &nl_query)
                .await
                .map_err(pipeline_error)?;
            let mut parameters = serde_json::Map::new();
            parameters.insert(
                "layer".to_string(),
                match outcome.primary_layer {
                    Some(layer) => Value::String(layer),
                    None => Value::Null,
                },
            );
            parameters.insert("ids".to_string(), serde_json::json!(outcome.ids));
            Ok(Json(QueryResponse::Action {
                action: ActionCommand {
                    intent: "FILTER".to_string(),
                    parameters,
                    restore_original: None,
                },
            }))
        }
        Intent::Action => {
            let command = run_action(&state.generator, &state.clusters, &nl_query)
                .await
                .map_err(pipeline_error)?;
            Ok(Json(QueryResponse::Action { action: command }))
        }
        Intent::Help => Ok(Json(QueryResponse::Help {
            response: help_text(),
        })),
    }
}

/// Static capability overview
#[debug_handler]
pub async fn get_help() -> Json<HelpResponse> {
    Json(HelpResponse {
        response: help_text(),
    })
}

/// Persist a natural-language query and its generated SQL
#[debug_handler]
pub async fn save_query(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SaveQueryRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let id = state
        .store
        .save_query(
            &request.nl_query,
            &request.sql_query,
            request.primary_layer.as_deref(),
        )
        .await
        .map_err(store_error)?;
    Ok(Json(MessageResponse {
        message: "Query saved successfully.".to_string(),
        id: Some(id),
    }))
}

/// List saved queries, id and natural-language text only
#[debug_handler]
pub async fn get_saved_queries(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<SavedQuerySummary>>, (StatusCode, String)> {
    let queries = state.store.list_queries().await.map_err(store_error)?;
    Ok(Json(queries))
}

/// Re-execute a saved query and return the matching ids
#[debug_handler]
pub async fn load_saved_query(
    State(state): State<Arc<ApiState>>,
    Path(query_id): Path<i64>,
) -> Result<Json<LoadSavedQueryResponse>, (StatusCode, String)> {
    let saved = state
        .store
        .load_query(query_id)
        .await
        .map_err(store_error)?
        .ok_or((StatusCode::NOT_FOUND, "Query not found".to_string()))?;

    let ids = state
        .store
        .select_ids(&saved.sql_query)
        .await
        .map_err(store_error)?;

    Ok(Json(LoadSavedQueryResponse {
        ids,
        primary_layer: saved.primary_layer,
        sql_query: saved.sql_query,
    }))
}

/// Delete a saved query
#[debug_handler]
pub async fn delete_saved_query(
    State(state): State<Arc<ApiState>>,
    Path(query_id): Path<i64>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .store
        .delete_query(query_id)
        .await
        .map_err(store_error)?;
    Ok(Json(MessageResponse {
        message: "Query deleted successfully.".to_string(),
        id: None,
    }))
}

/// Full layer geometry as a GeoJSON FeatureCollection
#[debug_handler]
pub async fn get_layer_geojson(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<LayerParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let collection = state
        .store
        .layer_geojson(&params.layer)
        .await
        .map_err(store_error)?;
    Ok(Json(collection))
}

/// Attribute columns of a single feature, for the map popup
#[debug_handler]
pub async fn get_layer_popup_properties(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<PopupParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let properties = state
        .store
        .popup_properties(&params.layer, params.feature_id)
        .await
        .map_err(store_error)?;
    Ok(Json(properties))
}

fn pipeline_error(error: PipelineError) -> (StatusCode, String) {
    tracing::error!("pipeline failure: {error}");
    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

fn store_error(error: StoreError) -> (StatusCode, String) {
    let status = match &error {
        StoreError::UnknownLayer(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!("store failure: {error}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_status_mapping() {
        let (status, _) = store_error(StoreError::UnknownLayer("rivers".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = store_error(StoreError::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, message) = store_error(StoreError::Query("syntax error".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("syntax error"));
    }
}
