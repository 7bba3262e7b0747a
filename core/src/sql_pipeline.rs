//! SQL synthesis & execution pipeline
//!
//! Turns a natural-language filter query into an executable statement
//! and runs it against the spatial store. Whatever the generator
//! produced, the executed statement is always the
//! `SELECT id FROM (...) AS subquery;` envelope, so the result set is
//! exactly one `id` column.

use crate::error::PipelineError;
use crate::llm::TextGenerator;
use crate::normalize::strip_code_fences;
use crate::prompts;
use crate::store::SpatialStore;
use crate::types::{FilterOutcome, GeneratedSql, SchemaInfo};
use regex::Regex;
use std::sync::OnceLock;

fn select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)SELECT\b.*?;").expect("static regex"))
}

fn primary_layer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-- primary_layer: (\w+)").expect("static regex"))
}

fn layer_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)layers\.([A-Za-z0-9_]+)").expect("static regex"))
}

/// Pull the primary layer out of the structural comment
///
/// Returns the captured identifier exactly as written; no comment means
/// `None` and downstream consumers must cope.
pub fn extract_primary_layer(text: &str) -> Option<String> {
    primary_layer_re()
        .captures(text)
        .map(|captures| captures[1].to_string())
}

/// Locate the first `SELECT ... ;` statement in generator text
pub fn extract_select_statement(text: &str) -> Option<String> {
    let matched = select_re().find(text)?;
    // Escaped characters survive when the generator emits JSON-escaped SQL
    let statement = matched
        .as_str()
        .replace("\\n", " ")
        .replace("\\u003e", ">")
        .replace("\\u003c", "<");
    Some(statement.trim().to_string())
}

/// Inject `id` into the projection when the statement never mentions it
pub fn ensure_id_projection(statement: &str) -> String {
    if statement.to_lowercase().contains("id") {
        return statement.to_string();
    }
    match statement.to_lowercase().find("select") {
        Some(pos) => {
            let end = pos + "select".len();
            format!("{} id,{}", &statement[..end], &statement[end..])
        }
        None => statement.to_string(),
    }
}

/// Wrap a statement in the id-projecting envelope
pub fn wrap_subquery(statement: &str) -> String {
    let inner = statement.trim().trim_end_matches(';').trim();
    format!("SELECT id FROM ({}) AS subquery;", inner)
}

/// Reject statements referencing tables outside the live schema
///
/// Generated SQL is executed directly, so every `layers.<table>`
/// reference must resolve against the known schema before it gets near
/// the store.
pub fn validate_tables(statement: &str, schema: &SchemaInfo) -> Result<(), PipelineError> {
    for captures in layer_table_re().captures_iter(statement) {
        let table = &captures[1];
        if !schema.contains_table(table) {
            return Err(PipelineError::QueryExecution(format!(
                "generated SQL references unknown layer table: {}",
                table
            )));
        }
    }
    Ok(())
}

/// Normalize generator text into executable SQL plus metadata
pub fn synthesize_sql(raw: &str, schema: &SchemaInfo) -> Result<GeneratedSql, PipelineError> {
    let cleaned = strip_code_fences(raw);

    let statement = extract_select_statement(&cleaned).ok_or_else(|| {
        PipelineError::SqlSynthesis(format!("no SQL statement found in response: {}", raw))
    })?;

    let primary_layer = extract_primary_layer(&cleaned);

    let statement = ensure_id_projection(&statement);
    validate_tables(&statement, schema)?;
    let statement = wrap_subquery(&statement);

    Ok(GeneratedSql {
        statement,
        primary_layer,
    })
}

/// Run a filter query end to end
///
/// Schema-aware prompt, one generation call, normalization, execution.
/// Store failures surface as `QueryExecution` and are not retried.
pub async fn run_filter<G, S>(
    generator: &G,
    store: &S,
    nl_query: &str,
) -> Result<FilterOutcome, PipelineError>
where
    G: TextGenerator,
    S: SpatialStore,
{
    let full_schema = store.table_schema(None).await?;
    let known = full_schema.table_names();
    let mentioned = prompts::relevant_tables(nl_query, &known);
    let prompt_schema = full_schema.filtered(&mentioned);

    let prompt = prompts::sql_prompt(nl_query, &prompt_schema);
    let raw = generator.generate(&prompt).await?;

    let generated = synthesize_sql(&raw, &full_schema)?;
    tracing::debug!(
        sql = %generated.statement,
        primary_layer = ?generated.primary_layer,
        "synthesized filter SQL"
    );

    let ids = store.select_ids(&generated.statement).await?;
    tracing::info!(rows = ids.len(), "filter query executed");

    Ok(FilterOutcome {
        ids,
        primary_layer: generated.primary_layer,
        sql_query: generated.statement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnInfo, TableSchema};

    fn schema(names: &[&str]) -> SchemaInfo {
        SchemaInfo {
            tables: names
                .iter()
                .map(|name| TableSchema {
                    name: name.to_string(),
                    columns: vec![ColumnInfo {
                        name: "id".to_string(),
                        data_type: "integer".to_string(),
                        nullable: false,
                    }],
                })
                .collect(),
        }
    }

    #[test]
    fn test_primary_layer_present() {
        let text = "-- primary_layer: parks\nSELECT id FROM layers.parks;";
        assert_eq!(extract_primary_layer(text), Some("parks".to_string()));
    }

    #[test]
    fn test_primary_layer_absent() {
        assert_eq!(extract_primary_layer("SELECT id FROM layers.parks;"), None);
    }

    #[test]
    fn test_primary_layer_case_sensitive_capture() {
        let text = "-- primary_layer: Cycle_Paths\nSELECT 1;";
        assert_eq!(extract_primary_layer(text), Some("Cycle_Paths".to_string()));
    }

    #[test]
    fn test_select_extraction_spans_lines() {
        let text = "some prose\nSELECT f.id\nFROM layers.fountains AS f;\ntrailing";
        let statement = extract_select_statement(text).unwrap();
        assert!(statement.starts_with("SELECT"));
        assert!(statement.ends_with(';'));
    }

    #[test]
    fn test_select_extraction_unescapes() {
        let text = r"SELECT id FROM layers.parks WHERE size > 5;";
        let statement = extract_select_statement(text).unwrap();
        assert!(statement.contains("size > 5"));
    }

    #[test]
    fn test_id_injection_when_missing() {
        let statement = "SELECT name FROM layers.parks;";
        // "name" does not contain "id", so it gets injected
        assert_eq!(
            ensure_id_projection(statement),
            "SELECT id, name FROM layers.parks;"
        );
    }

    #[test]
    fn test_id_injection_skipped_when_present() {
        let statement = "SELECT f.id FROM layers.fountains AS f;";
        assert_eq!(ensure_id_projection(statement), statement);
    }

    #[test]
    fn test_envelope_invariant() {
        let wrapped = wrap_subquery("SELECT id FROM layers.parks;");
        assert_eq!(
            wrapped,
            "SELECT id FROM (SELECT id FROM layers.parks) AS subquery;"
        );

        let re = Regex::new(r"(?s)^SELECT id FROM \(.*\) AS subquery;$").unwrap();
        assert!(re.is_match(&wrapped));

        // multi-line statements still satisfy the envelope
        let wrapped = wrap_subquery("SELECT f.id\nFROM layers.fountains AS f;");
        assert!(re.is_match(&wrapped));
    }

    #[test]
    fn test_validate_tables_accepts_known() {
        let statement = "SELECT f.id FROM layers.fountains AS f JOIN layers.parks AS p ON ST_Within(f.geom, p.geom);";
        assert!(validate_tables(statement, &schema(&["parks", "fountains"])).is_ok());
    }

    #[test]
    fn test_validate_tables_rejects_unknown() {
        let statement = "SELECT id FROM layers.users;";
        let err = validate_tables(statement, &schema(&["parks"])).unwrap_err();
        assert!(matches!(err, PipelineError::QueryExecution(_)));
        assert!(format!("{}", err).contains("users"));
    }

    #[test]
    fn test_synthesize_full_statement() {
        let raw = "```sql\n-- primary_layer: parks\nSELECT id FROM layers.parks;\n```";
        let generated = synthesize_sql(raw, &schema(&["parks"])).unwrap();
        assert_eq!(
            generated.statement,
            "SELECT id FROM (SELECT id FROM layers.parks) AS subquery;"
        );
        assert_eq!(generated.primary_layer, Some("parks".to_string()));
    }

    #[test]
    fn test_synthesize_without_sql_fails() {
        let err = synthesize_sql("I cannot write SQL for that.", &schema(&["parks"])).unwrap_err();
        assert!(matches!(err, PipelineError::SqlSynthesis(_)));
    }
}
