//! Core of mapspeak, a natural-language front end for a web map
//!
//! Accepts free-text user input, classifies it as a map action, a
//! spatial data filter, or a help request, and translates it into
//! either a structured map command or SQL executed against a spatial
//! store. The store and the text-generation backend are pluggable
//! collaborators behind traits.

pub mod action_pipeline;
pub mod config;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod prompts;
pub mod router;
pub mod sql_pipeline;
pub mod store;
pub mod types;

pub use action_pipeline::run_action;
pub use config::{AppConfig, ConfigError, LlmConfig, ServerConfig};
pub use error::PipelineError;
pub use llm::{create_generator, GatewayError, Generator, TextGenerator};
pub use router::route_intent;
pub use sql_pipeline::run_filter;
pub use store::{SavedQueryStore, SpatialStore, StoreError};
pub use types::{
    ActionCommand, ClusterState, ColumnInfo, FilterOutcome, GeneratedSql, Intent, RestoreOriginal,
    SavedQuery, SavedQuerySummary, SchemaInfo, TableSchema,
};
