//! Intent router
//!
//! Classifies an incoming query into ACTION / FILTER / HELP and lets the
//! caller dispatch. Fail-open policy: any gateway or normalization
//! failure is logged and routed as ACTION, so an unroutable query becomes
//! a likely-harmless map action instead of a hard error to the user.

use crate::llm::TextGenerator;
use crate::normalize;
use crate::prompts;
use crate::types::Intent;

/// Classify a natural-language query
pub async fn route_intent<G: TextGenerator>(generator: &G, query: &str) -> Intent {
    let prompt = prompts::intent_prompt(query);

    match generator.generate(&prompt).await {
        Ok(raw) => {
            let intent = normalize::normalize_intent(&raw);
            tracing::debug!(query = %query, intent = %intent.as_str(), "routed query");
            intent
        }
        Err(err) => {
            tracing::warn!(
                query = %query,
                error = %err,
                "intent classification failed, defaulting to ACTION"
            );
            Intent::Action
        }
    }
}
