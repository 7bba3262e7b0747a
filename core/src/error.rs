//! Pipeline error taxonomy
//!
//! Everything except intent routing propagates to the HTTP boundary as a
//! single opaque error with the underlying message attached. Routing
//! failures never reach this type; the router fails open to ACTION.

use crate::llm::GatewayError;
use crate::store::StoreError;

/// Errors from the SQL and action synthesis pipelines
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Text-generation backend failed (transport or payload)
    #[error("generation failed: {0}")]
    Generation(#[from] GatewayError),

    /// Generator text could not be normalized into a JSON object
    #[error("unparsable generator response: {0}")]
    Unparsable(String),

    /// No SQL statement found in the generator response
    #[error("SQL synthesis failed: {0}")]
    SqlSynthesis(String),

    /// Generator text could not be normalized into an action command
    ///
    /// Carries the raw generator text for diagnosability.
    #[error("action synthesis failed: {message} (raw response: {raw})")]
    ActionSynthesis { message: String, raw: String },

    /// Synthesized SQL was rejected or failed against the spatial store
    #[error("query execution failed: {0}")]
    QueryExecution(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::QueryExecution(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_synthesis_carries_raw_text() {
        let err = PipelineError::ActionSynthesis {
            message: "expected object".to_string(),
            raw: "Sure! Here is your zoom.".to_string(),
        };
        let rendered = format!("{}", err);
        assert!(rendered.contains("expected object"));
        assert!(rendered.contains("Sure! Here is your zoom."));
    }

    #[test]
    fn test_store_error_maps_to_query_execution() {
        let err: PipelineError = StoreError::Query("syntax error at subquery".to_string()).into();
        assert!(matches!(err, PipelineError::QueryExecution(_)));
        assert!(format!("{}", err).contains("syntax error"));
    }
}
