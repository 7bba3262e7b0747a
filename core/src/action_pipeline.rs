//! Action synthesis pipeline
//!
//! Turns a natural-language map action into a structured command for the
//! map client noting cluster-overlay side effects along the way:
//! removing a cluster view implies the base layer must reappear, so a
//! `CLUSTER`/`REMOVE` command carries a `restore_original` directive.

use crate::error::PipelineError;
use crate::llm::TextGenerator;
use crate::normalize;
use crate::prompts;
use crate::types::{ActionCommand, ClusterState, RestoreOriginal};

/// Run an action query end to end
pub async fn run_action<G: TextGenerator>(
    generator: &G,
    clusters: &ClusterState,
    query: &str,
) -> Result<ActionCommand, PipelineError> {
    let prompt = prompts::action_prompt(query);
    let raw = generator.generate(&prompt).await?;

    let value = normalize::extract_json_object(&raw).map_err(|err| {
        PipelineError::ActionSynthesis {
            message: err.to_string(),
            raw: raw.clone(),
        }
    })?;

    let mut command: ActionCommand =
        serde_json::from_value(value).map_err(|err| PipelineError::ActionSynthesis {
            message: format!("malformed action object: {}", err),
            raw: raw.clone(),
        })?;

    if command.intent == "CLUSTER" {
        apply_cluster_side_effects(&mut command, clusters);
    }

    tracing::debug!(intent = %command.intent, "synthesized action command");
    Ok(command)
}

/// Track cluster overlays and attach the restore directive on removal
fn apply_cluster_side_effects(command: &mut ActionCommand, clusters: &ClusterState) {
    let layer = command
        .parameters
        .get("layer")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let action = command
        .parameters
        .get("action")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let (Some(layer), Some(action)) = (layer, action) else {
        tracing::warn!("CLUSTER command without layer/action parameters");
        return;
    };

    match action.as_str() {
        "ADD" => clusters.set(&layer, true),
        "REMOVE" => {
            clusters.set(&layer, false);
            command.restore_original = Some(RestoreOriginal {
                layer,
                action: "ADD".to_string(),
            });
        }
        other => {
            tracing::warn!(action = %other, "unrecognized cluster action");
        }
    }
}
