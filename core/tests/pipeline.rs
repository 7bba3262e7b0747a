//! End-to-end pipeline tests with a stub generator and an in-memory
//! spatial store. No network, no database.

use async_trait::async_trait;
use mapspeak_core::llm::stub::StubGenerator;
use mapspeak_core::store::{SpatialStore, StoreError};
use mapspeak_core::types::{ClusterState, ColumnInfo, Intent, SchemaInfo, TableSchema};
use mapspeak_core::{route_intent, run_action, run_filter, PipelineError};
use std::sync::Mutex;

/// In-memory spatial store fixture
struct MemoryStore {
    schema: SchemaInfo,
    ids: Vec<i64>,
    /// Statements seen by select_ids, for assertions
    executed: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl MemoryStore {
    fn new(tables: &[&str], ids: Vec<i64>) -> Self {
        let schema = SchemaInfo {
            tables: tables
                .iter()
                .map(|name| TableSchema {
                    name: name.to_string(),
                    columns: vec![
                        ColumnInfo {
                            name: "id".to_string(),
                            data_type: "integer".to_string(),
                            nullable: false,
                        },
                        ColumnInfo {
                            name: "name".to_string(),
                            data_type: "text".to_string(),
                            nullable: true,
                        },
                    ],
                })
                .collect(),
        };
        Self {
            schema,
            ids,
            executed: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    fn failing(tables: &[&str], message: &str) -> Self {
        let mut store = Self::new(tables, Vec::new());
        store.fail_with = Some(message.to_string());
        store
    }

    fn last_statement(&self) -> Option<String> {
        self.executed.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SpatialStore for MemoryStore {
    async fn select_ids(&self, sql: &str) -> Result<Vec<i64>, StoreError> {
        self.executed.lock().unwrap().push(sql.to_string());
        match &self.fail_with {
            Some(message) => Err(StoreError::Query(message.clone())),
            None => Ok(self.ids.clone()),
        }
    }

    async fn table_schema(&self, tables: Option<&[String]>) -> Result<SchemaInfo, StoreError> {
        Ok(match tables {
            Some(names) => self.schema.filtered(names),
            None => self.schema.clone(),
        })
    }
}

#[tokio::test]
async fn zoom_query_routes_to_action_and_passes_command_through() {
    // intent classification answer, then the action object
    let generator = StubGenerator::with_responses([
        "ACTION",
        r#"{"intent":"ZOOM_IN","parameters":{"levels":2}}"#,
    ]);
    let clusters = ClusterState::new();

    let intent = route_intent(&generator, "zoom in 2 levels").await;
    assert_eq!(intent, Intent::Action);

    let command = run_action(&generator, &clusters, "zoom in 2 levels")
        .await
        .unwrap();
    assert_eq!(command.intent, "ZOOM_IN");
    assert_eq!(command.parameters["levels"], 2);
    assert!(command.restore_original.is_none());
    assert!(!clusters.is_clustered("fountains"));
}

#[test]
fn action_prompt_describes_zoom_in() {
    let prompt = mapspeak_core::prompts::action_prompt("zoom in 2 levels");
    assert!(prompt.contains("ZOOM_IN - Zoom in one level"));
}

#[tokio::test]
async fn parks_query_routes_to_filter_and_wraps_sql() {
    let generator = StubGenerator::with_responses([
        "FILTER",
        "-- primary_layer: parks\nSELECT id FROM layers.parks;",
    ]);
    let store = MemoryStore::new(&["parks", "fountains", "cycle_paths"], vec![1, 2, 3]);

    let intent = route_intent(&generator, "show me all parks").await;
    assert_eq!(intent, Intent::Filter);

    let outcome = run_filter(&generator, &store, "show me all parks")
        .await
        .unwrap();

    assert_eq!(outcome.ids, vec![1, 2, 3]);
    assert_eq!(outcome.primary_layer, Some("parks".to_string()));
    assert_eq!(
        outcome.sql_query,
        "SELECT id FROM (SELECT id FROM layers.parks) AS subquery;"
    );
    assert_eq!(store.last_statement(), Some(outcome.sql_query.clone()));
}

#[tokio::test]
async fn fenced_sql_response_matches_unfenced() {
    let plain = "-- primary_layer: fountains\nSELECT f.id FROM layers.fountains AS f;";
    let fenced = format!("```sql\n{}\n```", plain);

    let store = MemoryStore::new(&["fountains"], vec![7]);

    let from_plain = run_filter(&StubGenerator::with_response(plain), &store, "fountains")
        .await
        .unwrap();
    let from_fenced = run_filter(&StubGenerator::with_response(&fenced), &store, "fountains")
        .await
        .unwrap();

    assert_eq!(from_plain.sql_query, from_fenced.sql_query);
    assert_eq!(from_plain.primary_layer, from_fenced.primary_layer);
}

#[tokio::test]
async fn filter_without_sql_in_response_fails_synthesis() {
    let generator = StubGenerator::with_response("Sorry, I can't produce a query for that.");
    let store = MemoryStore::new(&["parks"], vec![]);

    let err = run_filter(&generator, &store, "show me all parks")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::SqlSynthesis(_)));
    // nothing reached the store
    assert_eq!(store.last_statement(), None);
}

#[tokio::test]
async fn filter_referencing_unknown_table_is_rejected_before_execution() {
    let generator =
        StubGenerator::with_response("-- primary_layer: users\nSELECT id FROM layers.users;");
    let store = MemoryStore::new(&["parks"], vec![1]);

    let err = run_filter(&generator, &store, "show me all users")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::QueryExecution(_)));
    assert_eq!(store.last_statement(), None);
}

#[tokio::test]
async fn store_failure_propagates_as_query_execution() {
    let generator =
        StubGenerator::with_response("-- primary_layer: parks\nSELECT id FROM layers.parks;");
    let store = MemoryStore::failing(&["parks"], "relation does not exist");

    let err = run_filter(&generator, &store, "show me all parks")
        .await
        .unwrap_err();
    match err {
        PipelineError::QueryExecution(message) => {
            assert!(message.contains("relation does not exist"))
        }
        other => panic!("expected QueryExecution, got {:?}", other),
    }
}

#[tokio::test]
async fn cluster_round_trip_tracks_state_and_restores_layer() {
    let generator = StubGenerator::with_responses([
        r#"{"intent":"CLUSTER","parameters":{"action":"ADD","layer":"fountains"}}"#,
        r#"{"intent":"CLUSTER","parameters":{"action":"REMOVE","layer":"fountains"}}"#,
    ]);
    let clusters = ClusterState::new();

    let added = run_action(&generator, &clusters, "cluster the fountains")
        .await
        .unwrap();
    assert!(clusters.is_clustered("fountains"));
    assert!(added.restore_original.is_none());

    let removed = run_action(&generator, &clusters, "uncluster the fountains")
        .await
        .unwrap();
    assert!(!clusters.is_clustered("fountains"));
    let restore = removed.restore_original.expect("restore directive");
    assert_eq!(restore.layer, "fountains");
    assert_eq!(restore.action, "ADD");
}

#[tokio::test]
async fn wrapped_generator_payload_still_yields_action() {
    // backend that wraps its text in a response envelope with fences
    let generator = StubGenerator::with_response(
        r#"{"response":"```json\n{\"intent\":\"FLY_TO\",\"parameters\":{\"lng\":-0.1276,\"lat\":51.5074}}\n```"}"#,
    );
    let clusters = ClusterState::new();

    let command = run_action(&generator, &clusters, "go to London")
        .await
        .unwrap();
    assert_eq!(command.intent, "FLY_TO");
    assert_eq!(command.parameters["lat"], 51.5074);
}
