//! Store capability seams
//!
//! The core does not own a database. It consumes two capabilities:
//! running a spatial query that yields row identifiers, and persisting
//! saved queries. `mapspeak-databases` provides the PostGIS-backed
//! implementations; tests use in-memory ones.

use crate::types::{SavedQuery, SavedQuerySummary, SchemaInfo};
use async_trait::async_trait;

/// Errors from store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection could not be established or was lost
    #[error("store connection error: {0}")]
    Connection(String),

    /// Statement failed against the live schema
    #[error("store query error: {0}")]
    Query(String),

    /// Requested layer does not exist in the schema
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// Row lookup matched nothing
    #[error("not found")]
    NotFound,
}

/// "Run spatial query, return row IDs" capability
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Execute a SELECT and collect the first column of every row
    async fn select_ids(&self, sql: &str) -> Result<Vec<i64>, StoreError>;

    /// Schema metadata for the spatial tables
    ///
    /// `tables: None` returns every table in the spatial schema.
    async fn table_schema(&self, tables: Option<&[String]>) -> Result<SchemaInfo, StoreError>;
}

/// "Persist/retrieve a saved query" capability
#[async_trait]
pub trait SavedQueryStore: Send + Sync {
    async fn save_query(
        &self,
        nl_query: &str,
        sql_query: &str,
        primary_layer: Option<&str>,
    ) -> Result<i64, StoreError>;

    async fn list_queries(&self) -> Result<Vec<SavedQuerySummary>, StoreError>;

    async fn load_query(&self, id: i64) -> Result<Option<SavedQuery>, StoreError>;

    async fn delete_query(&self, id: i64) -> Result<(), StoreError>;
}
