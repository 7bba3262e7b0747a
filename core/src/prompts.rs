//! Prompt builders
//!
//! Pure, deterministic string builders. Each prompt embeds the task
//! framing, an explicit output-format contract, the domain vocabulary,
//! and worked input/output examples. The SQL builder takes live schema
//! metadata so the instruction stays accurate as layers are added.

use crate::types::SchemaInfo;

/// Narrow the schema section to tables the query actually mentions
///
/// Naive singular/plural mention matching on the lowercased query; a
/// query that names no table (e.g. "show me everything") gets the full
/// schema.
pub fn relevant_tables(nl_query: &str, known_tables: &[String]) -> Vec<String> {
    let query = nl_query.to_lowercase();

    let mentioned: Vec<String> = known_tables
        .iter()
        .filter(|table| {
            let spoken = table.to_lowercase().replace('_', " ");
            let singular = spoken.strip_suffix('s').unwrap_or(&spoken);
            query.contains(&spoken) || query.contains(singular)
        })
        .cloned()
        .collect();

    if mentioned.is_empty() {
        known_tables.to_vec()
    } else {
        mentioned
    }
}

/// Render the schema section of the SQL prompt
fn schema_section(schema: &SchemaInfo) -> String {
    let mut section = String::from(
        "### Database Schema\nThe database contains the following tables:\n\n",
    );
    for (index, table) in schema.tables.iter().enumerate() {
        section.push_str(&format!("{}. `layers.{}`:\n", index + 1, table.name));
        for column in &table.columns {
            let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
            section.push_str(&format!(
                "   - `{}` ({}, {})\n",
                column.name, column.data_type, nullable
            ));
        }
        section.push('\n');
    }
    section
}

/// Build the SQL-generation prompt
pub fn sql_prompt(nl_query: &str, schema: &SchemaInfo) -> String {
    format!(
        r#"Convert the following natural language query into a valid SQL statement for a PostGIS database.

{schema}### Important Notes
- There are NO foreign key relationships between tables (no park_id, fountain_id, etc.)
- To find relationships between features (e.g., fountains inside parks), use spatial functions like ST_Within
- For counting features inside other features, use subqueries with spatial joins
- When counting features inside other features, use GROUP BY on the containing feature's ID

### Query Requirements
- Ensure **all string comparisons are case-insensitive**.
- If the query involves spatial relationships (e.g., "inside," "within," "near"), use appropriate PostGIS functions like `ST_Within` or `ST_Intersects`.
- If spatial transformations are required (i.e., geometries are in different SRIDs), use `ST_Transform(geometry, target_srid)` and specify the SRID explicitly (e.g., 4326 for WGS 84).
- If the query involves checking for null values, use `IS NOT NULL` or `IS NULL` as appropriate.
- Always qualify the `id` column with the table name (e.g., `fountains.id` or `parks.id`).
- Use `JOIN` instead of subqueries when checking spatial relationships to avoid errors with multiple rows.
- Do not treat the string `'null'` as a literal value unless explicitly stated in the query.
- If all geometries are already in the same SRID, do not use `ST_Transform`.
- If the query has the words empty or null, check for null values and empty strings in the column.
- Always include the `id` column in the SELECT statement.
- If the query is a general request for all rows in a table (e.g., "show me all parks"), return all rows without additional filtering.
- ALWAYS use fully qualified table names (e.g., `layers.fountains`, `layers.parks`, `layers.cycle_paths`)
- ALWAYS use table aliases in JOINs and WHERE clauses (e.g., `FROM layers.fountains AS f`)
- ALWAYS qualify column names with table aliases (e.g., `f.id`, `p.name`)
- Include a comment in the SQL query specifying the primary layer to filter on. For example:
  ```sql
  -- primary_layer: fountains
  ```

### Example Queries
- Show all parks:
  ```sql
  -- primary_layer: parks
  SELECT id FROM layers.parks;
  ```
- Find all fountains inside parks:
  ```sql
  -- primary_layer: fountains
  SELECT f.id
  FROM layers.fountains AS f
  JOIN layers.parks AS p
  ON ST_Within(f.geom, p.geom);
  ```
- Find all cycle paths that intersect parks:
  ```sql
  -- primary_layer: cycle_paths
  SELECT DISTINCT c.id
  FROM layers.cycle_paths AS c
  JOIN layers.parks AS p
  ON ST_Intersects(c.geom, p.geom);
  ```
- Find all fountains inside parks with a specific name:
  ```sql
  -- primary_layer: fountains
  SELECT f.id
  FROM layers.fountains AS f
  JOIN layers.parks AS p
  ON ST_Within(f.geom, p.geom)
  WHERE p.name ILIKE 'Kensington Gardens';
  ```

### Input
Natural Language Query: "{query}"

### Output
Return only the valid SQL query.

SQL:
"#,
        schema = schema_section(schema),
        query = nl_query
    )
}

/// The action vocabulary and output contract
///
/// The twelve action kinds, their parameter names, and value ranges are
/// part of the contract with the map client and must stay word-for-word
/// stable.
const ACTION_VOCABULARY: &str = r#"Available actions and their parameters:
1. ZOOM_IN - Zoom in one level
2. ZOOM_OUT - Zoom out one level
3. SET_ZOOM - Set specific zoom level (requires "level" parameter: number 0-20)
4. PAN - Move in a direction (requires "x" and "y" parameters: numbers in pixels)
5. FLY_TO - Animate to location (requires "lng" and "lat" parameters: numbers)
6. JUMP_TO - Instantly move to location (requires "lng" and "lat" parameters: numbers)
7. ROTATE - Rotate map view (requires "degrees" parameter: number 0-360)
8. PITCH - Tilt map view (requires "degrees" parameter: number 0-60)
9. RESET_VIEW - Reset to default view
10. HEAT_MAP - Add, update or remove the heat map layer (requires "action" and "layer" parameters: "action": "ADD" or "REMOVE", "layer": "fountains")
11. CLUSTER - Add or remove cluster layer for point data (requires "action" and "layer" parameters: "action": "ADD" or "REMOVE", "layer": "fountains")
12. CHANGE_SYMBOLOGY - Change the appearance of a layer (requires "layer" parameter, and optionally "color", "radius", "strokeWidth", and/or "fillOpacity" parameters)
   - "layer": name of the layer to change
   - "color": color in any valid CSS format (hex, rgb, hsl, named colors)
   - "radius": number representing the new radius in pixels (e.g., 10, 15, 20)
   - "strokeWidth": number representing the new stroke width in pixels (e.g., 2, 3, 5)
   - "fillOpacity": number between 0 and 1 representing the fill opacity (e.g., 0.2, 0.5, 0.8)
   Note: You can provide any combination of these parameters depending on what the user wants to change"#;

const ACTION_EXAMPLES: &str = r##"Examples:
- "zoom in 2 levels" -> {"intent": "ZOOM_IN", "parameters": {"levels": 2}}
- "move left" -> {"intent": "PAN", "parameters": {"x": -100, "y": 0}}
- "go to London" -> {"intent": "FLY_TO", "parameters": {"lng": -0.1276, "lat": 51.5074}}
- "rotate 90 degrees" -> {"intent": "ROTATE", "parameters": {"degrees": 90}}
- "add heat map" -> {"intent": "HEAT_MAP", "parameters": {"action": "ADD", "layer": "fountains"}}
- "add cluster layer" -> {"intent": "CLUSTER", "parameters": {"action": "ADD", "layer": "fountains"}}
- "remove cluster layer" -> {"intent": "CLUSTER", "parameters": {"action": "REMOVE", "layer": "fountains"}}
- "what can I do?" -> {"intent": "HELP", "parameters": {"type": "actions"}}
- "show me available actions" -> {"intent": "HELP", "parameters": {"type": "actions"}}
- "change fountains to red" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "fountains", "color": "#FF0000"}}
- "make parks green" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "parks", "color": "#00FF00"}}
- "set cycle paths color to blue" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "cycle_paths", "color": "#0000FF"}}
- "change the color of fountains to rgb(255, 0, 0)" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "fountains", "color": "rgb(255, 0, 0)"}}
- "make fountains bigger" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "fountains", "radius": 10}}
- "make fountains smaller" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "fountains", "radius": 4}}
- "set fountains radius to 15" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "fountains", "radius": 15}}
- "make fountains red and bigger" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "fountains", "color": "#FF0000", "radius": 10}}
- "make cycle paths thicker" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "cycle_paths", "strokeWidth": 5}}
- "set cycle paths to red and make them thicker" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "cycle_paths", "color": "#FF0000", "strokeWidth": 5}}
- "make parks more transparent" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "parks", "fillOpacity": 0.3}}
- "make parks more opaque" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "parks", "fillOpacity": 0.8}}
- "set parks to green and make them more transparent" -> {"intent": "CHANGE_SYMBOLOGY", "parameters": {"layer": "parks", "color": "#00FF00", "fillOpacity": 0.3}}"##;

/// Build the action-generation prompt
pub fn action_prompt(action: &str) -> String {
    format!(
        r##"IMPORTANT: Respond with ONLY a JSON object. Do not include any explanations, markdown formatting, or additional text.

Convert the following natural language map action into a structured JSON format.

If the user is asking for help or information about available actions, respond with:
{{
    "intent": "HELP",
    "parameters": {{
        "type": "actions"
    }}
}}

{vocabulary}

The response must be a JSON object with:
- "intent": One of the action types in CAPS or "HELP"
- "parameters": Object containing required parameters for the action

{examples}

The color parameter can be:
- Hex color (e.g., "#FF0000")
- RGB color (e.g., "rgb(255, 0, 0)")
- HSL color (e.g., "hsl(0, 100%, 50%)")
- Named color (e.g., "red", "blue", "green")

Action: {action}

REMEMBER: Respond with ONLY the JSON object, no other text or formatting.
"##,
        vocabulary = ACTION_VOCABULARY,
        examples = ACTION_EXAMPLES,
        action = action
    )
}

/// Build the intent-classification prompt
pub fn intent_prompt(query: &str) -> String {
    format!(
        r#"Classify this query into exactly one word: ACTION, FILTER, or HELP.

Important: only respond with one word, no other text or punctuation.

Query: {query}

Examples:
"zoom in" -> ACTION
"show me all parks" -> FILTER
"what can I do" -> HELP
"make fountains red" -> ACTION
"find cycle paths near parks" -> FILTER
"help" -> HELP
"make parks green" -> ACTION
"show me the cycle paths layer" -> FILTER
"what can i do with this map?" -> HELP

Your response (one word only):"#,
        query = query
    )
}

/// Friendly capability summary served on help requests
pub fn help_text() -> String {
    r##"Here's what you can do with the map:

Basic Map Controls:
- Zoom in or out ("zoom in a bit", "zoom out 2 levels")
- Set a specific zoom level ("zoom to level 12")
- Move around ("pan left", "move right", "go up")
- Fly to places ("fly to London", "take me to Paris")
- Jump to locations ("jump to New York", "show me Tokyo")
- Rotate the view ("rotate 45 degrees", "turn right")
- Tilt the view ("tilt up 30 degrees", "pitch down")
- Reset everything ("reset view", "start over")

Visual Effects:
- Change layer appearance:
  * Change colors ("make parks green", "change fountains to blue")
  * Change sizes ("make fountains bigger", "increase the size of fountains")
  * Change line thickness ("make cycle paths thicker", "set cycle paths width to 3")
  * Change fill opacity ("make parks more transparent", "set parks to be more opaque")
  * Change multiple properties at once ("make parks green and more transparent")
- Add heat maps ("show heat map", "add heat map for fountains")
- Remove heat maps ("remove heat map", "hide heat map")
- Cluster points ("cluster the fountains", "group points together")
- Remove clusters ("uncluster points", "remove grouping")

Help:
- Ask what's possible ("what can I do?", "show me available actions")
- Get help with specific features ("how do I zoom?", "what colors can I use?")

For colors, you can use:
- Simple color names ("red", "blue", "green")
- Descriptive colors ("dark blue", "light green", "bright red")
- Specific codes if you want ("#FF0000", "rgb(255,0,0)")"##
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnInfo, TableSchema};

    fn sample_schema() -> SchemaInfo {
        SchemaInfo {
            tables: vec![TableSchema {
                name: "parks".to_string(),
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
            }],
        }
    }

    #[test]
    fn test_sql_prompt_embeds_schema_and_query() {
        let prompt = sql_prompt("show me all parks", &sample_schema());
        assert!(prompt.contains("`layers.parks`"));
        assert!(prompt.contains("`id` (integer, NOT NULL)"));
        assert!(prompt.contains("`name` (text, NULL)"));
        assert!(prompt.contains("Natural Language Query: \"show me all parks\""));
        assert!(prompt.contains("-- primary_layer:"));
    }

    #[test]
    fn test_action_prompt_enumerates_all_kinds() {
        let prompt = action_prompt("zoom in 2 levels");
        for kind in [
            "ZOOM_IN",
            "ZOOM_OUT",
            "SET_ZOOM",
            "PAN",
            "FLY_TO",
            "JUMP_TO",
            "ROTATE",
            "PITCH",
            "RESET_VIEW",
            "HEAT_MAP",
            "CLUSTER",
            "CHANGE_SYMBOLOGY",
        ] {
            assert!(prompt.contains(kind), "missing action kind {}", kind);
        }
        assert!(prompt.contains("ZOOM_IN - Zoom in one level"));
        assert!(prompt.contains("number 0-360"));
        assert!(prompt.contains("number 0-60"));
        assert!(prompt.contains("number 0-20"));
        assert!(prompt.contains("Action: zoom in 2 levels"));
    }

    #[test]
    fn test_intent_prompt_contains_query_and_contract() {
        let prompt = intent_prompt("zoom in");
        assert!(prompt.contains("exactly one word: ACTION, FILTER, or HELP"));
        assert!(prompt.contains("Query: zoom in"));
    }

    #[test]
    fn test_relevant_tables_matches_singular_and_plural() {
        let known = vec![
            "parks".to_string(),
            "fountains".to_string(),
            "cycle_paths".to_string(),
        ];
        assert_eq!(
            relevant_tables("show me every park", &known),
            vec!["parks".to_string()]
        );
        assert_eq!(
            relevant_tables("fountains inside parks", &known),
            vec!["parks".to_string(), "fountains".to_string()]
        );
        assert_eq!(
            relevant_tables("show cycle paths", &known),
            vec!["cycle_paths".to_string()]
        );
    }

    #[test]
    fn test_relevant_tables_falls_back_to_all() {
        let known = vec!["parks".to_string(), "fountains".to_string()];
        assert_eq!(relevant_tables("show me everything", &known), known);
    }
}
