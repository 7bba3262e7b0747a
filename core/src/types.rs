//! Shared types for the query pipeline
//!
//! Pure data structures. No IO, no side effects, except `ClusterState`
//! which is the one piece of process-wide advisory state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Three-way classification of an incoming query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Map manipulation command (zoom, pan, symbology, ...)
    Action,
    /// Spatial data filter, answered through SQL
    Filter,
    /// Help / capability question
    Help,
}

impl Intent {
    /// Parse an uppercase classification token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ACTION" => Some(Intent::Action),
            "FILTER" => Some(Intent::Filter),
            "HELP" => Some(Intent::Help),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Action => "ACTION",
            Intent::Filter => "FILTER",
            Intent::Help => "HELP",
        }
    }
}

/// Column metadata from the live schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// One spatial table and its columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Live schema metadata for the spatial store
///
/// Fed into the SQL prompt builder so the instruction stays accurate as
/// layers are added, and used as the allowlist for table validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub tables: Vec<TableSchema>,
}

impl SchemaInfo {
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Restrict to the named tables, preserving order
    pub fn filtered(&self, names: &[String]) -> SchemaInfo {
        SchemaInfo {
            tables: self
                .tables
                .iter()
                .filter(|t| names.iter().any(|n| n.eq_ignore_ascii_case(&t.name)))
                .cloned()
                .collect(),
        }
    }
}

/// SQL derived from a natural-language query
///
/// `statement` is always the executable `SELECT id FROM (...) AS subquery;`
/// envelope, never the generator's raw output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql {
    pub statement: String,
    pub primary_layer: Option<String>,
}

/// Result of running a filter query end to end
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub ids: Vec<i64>,
    pub primary_layer: Option<String>,
    pub sql_query: String,
}

/// Directive to re-apply a layer after its cluster overlay is removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOriginal {
    pub layer: String,
    pub action: String,
}

/// Structured map command emitted by the action pipeline
///
/// `intent` is one of the twelve action kinds or "HELP"; the shape of
/// `parameters` depends on the kind and is passed through to the map
/// client unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub intent: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_original: Option<RestoreOriginal>,
}

/// Saved query record from the external store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: i64,
    pub nl_query: String,
    pub sql_query: String,
    pub primary_layer: Option<String>,
}

/// Listing entry for saved queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuerySummary {
    pub id: i64,
    pub nl_query: String,
}

/// Which layers currently have a cluster overlay
///
/// Advisory only; the map client is the source of truth for what is
/// rendered. Owned by the server lifecycle and passed by handle into the
/// action pipeline; not persisted across restarts.
#[derive(Debug, Default)]
pub struct ClusterState {
    inner: Mutex<HashMap<String, bool>>,
}

impl ClusterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, layer: &str, clustered: bool) {
        let mut map = self.inner.lock().expect("cluster state lock poisoned");
        map.insert(layer.to_string(), clustered);
    }

    pub fn is_clustered(&self, layer: &str) -> bool {
        let map = self.inner.lock().expect("cluster state lock poisoned");
        map.get(layer).copied().unwrap_or(false)
    }
}
