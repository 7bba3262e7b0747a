//! PostGIS connection manager
//!
//! All spatial tables live in the `layers` schema and saved queries in
//! `main.saved_queries`. Layer names arriving from the outside are only
//! ever interpolated into SQL after they have been checked against the
//! live `information_schema` allowlist.

use async_trait::async_trait;
use mapspeak_core::store::{SavedQueryStore, SpatialStore, StoreError};
use mapspeak_core::types::{ColumnInfo, SavedQuery, SavedQuerySummary, SchemaInfo, TableSchema};
use serde_json::{json, Value as JsonValue};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};

/// PostGIS-backed store for spatial queries and saved queries
#[derive(Clone)]
pub struct PostgisStore {
    pool: PgPool,
}

impl PostgisStore {
    /// Connect to the database and build the pool
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to PostGIS database");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool, used by integration tests
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a layer name against the live schema
    ///
    /// Returns the canonical table name, so the caller never interpolates
    /// caller-supplied text into SQL.
    async fn resolve_layer(&self, layer: &str) -> Result<TableSchema, StoreError> {
        let schema = self.table_schema(None).await?;
        schema
            .tables
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(layer))
            .ok_or_else(|| StoreError::UnknownLayer(layer.to_string()))
    }

    /// Fetch a layer as a GeoJSON FeatureCollection
    ///
    /// Each feature carries the row id as its only property; attribute
    /// lookup goes through [`PostgisStore::popup_properties`] instead.
    pub async fn layer_geojson(&self, layer: &str) -> Result<JsonValue, StoreError> {
        let table = self.resolve_layer(layer).await?;

        let sql = format!(
            "SELECT id, ST_AsGeoJSON(geom) FROM layers.{}",
            table.name
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let mut features = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = first_column_as_i64(row)?;
            let geometry: String = row.try_get(1).map_err(map_sqlx)?;
            let geometry: JsonValue = serde_json::from_str(&geometry)
                .map_err(|e| StoreError::Query(format!("invalid geometry JSON: {e}")))?;
            features.push((id, geometry));
        }
        debug!(layer = %table.name, features = features.len(), "assembled layer GeoJSON");
        Ok(feature_collection(features))
    }

    /// Fetch the non-geometry attributes of a single feature
    pub async fn popup_properties(
        &self,
        layer: &str,
        feature_id: i64,
    ) -> Result<JsonValue, StoreError> {
        let table = self.resolve_layer(layer).await?;
        let columns: Vec<&str> = table
            .columns
            .iter()
            .filter(|c| !is_geometry_column(c))
            .map(|c| c.name.as_str())
            .collect();
        if columns.is_empty() {
            return Err(StoreError::Query(format!(
                "layer {} has no attribute columns",
                table.name
            )));
        }

        let column_list = columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT row_to_json(t) AS properties FROM \
             (SELECT {column_list} FROM layers.{} WHERE id = $1) AS t",
            table.name
        );
        let row = sqlx::query(&sql)
            .bind(feature_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or(StoreError::NotFound)?;

        row.try_get::<JsonValue, _>("properties").map_err(map_sqlx)
    }
}

#[async_trait]
impl SpatialStore for PostgisStore {
    async fn select_ids(&self, sql: &str) -> Result<Vec<i64>, StoreError> {
        debug!(sql, "executing spatial query");
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(first_column_as_i64).collect()
    }

    async fn table_schema(&self, tables: Option<&[String]>) -> Result<SchemaInfo, StoreError> {
        let table_names: Vec<String> = match tables {
            Some(names) => names.to_vec(),
            None => sqlx::query_scalar(
                "SELECT table_name \
                 FROM information_schema.tables \
                 WHERE table_schema = 'layers' \
                 ORDER BY table_name",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?,
        };

        let mut schema = SchemaInfo::default();
        for name in table_names {
            let rows = sqlx::query(
                "SELECT column_name, data_type, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = 'layers' AND table_name = $1 \
                 ORDER BY ordinal_position",
            )
            .bind(&name)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

            if rows.is_empty() {
                warn!(table = %name, "requested table has no columns in layers schema");
                continue;
            }

            let columns = rows
                .iter()
                .map(|row| {
                    Ok(ColumnInfo {
                        name: row.try_get("column_name").map_err(map_sqlx)?,
                        data_type: row.try_get("data_type").map_err(map_sqlx)?,
                        nullable: row.try_get::<String, _>("is_nullable").map_err(map_sqlx)?
                            == "YES",
                    })
                })
                .collect::<Result<Vec<_>, StoreError>>()?;
            schema.tables.push(TableSchema { name, columns });
        }
        Ok(schema)
    }
}

#[async_trait]
impl SavedQueryStore for PostgisStore {
    async fn save_query(
        &self,
        nl_query: &str,
        sql_query: &str,
        primary_layer: Option<&str>,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "INSERT INTO main.saved_queries (nl_query, sql_query, primary_layer) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(nl_query)
        .bind(sql_query)
        .bind(primary_layer)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        first_column_as_i64(&row)
    }

    async fn list_queries(&self) -> Result<Vec<SavedQuerySummary>, StoreError> {
        let rows = sqlx::query("SELECT id, nl_query FROM main.saved_queries ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter()
            .map(|row| {
                Ok(SavedQuerySummary {
                    id: first_column_as_i64(row)?,
                    nl_query: row.try_get("nl_query").map_err(map_sqlx)?,
                })
            })
            .collect()
    }

    async fn load_query(&self, id: i64) -> Result<Option<SavedQuery>, StoreError> {
        let row = sqlx::query(
            "SELECT id, nl_query, sql_query, primary_layer \
             FROM main.saved_queries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(|row| {
            Ok(SavedQuery {
                id: first_column_as_i64(&row)?,
                nl_query: row.try_get("nl_query").map_err(map_sqlx)?,
                sql_query: row.try_get("sql_query").map_err(map_sqlx)?,
                primary_layer: row.try_get("primary_layer").map_err(map_sqlx)?,
            })
        })
        .transpose()
    }

    async fn delete_query(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM main.saved_queries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Read the first column as i64, tolerating int4 id columns
fn first_column_as_i64(row: &PgRow) -> Result<i64, StoreError> {
    if let Ok(id) = row.try_get::<i64, _>(0) {
        return Ok(id);
    }
    row.try_get::<i32, _>(0)
        .map(i64::from)
        .map_err(|e| StoreError::Query(format!("first column is not an integer id: {e}")))
}

/// PostGIS geometry columns are reported as USER-DEFINED by information_schema
fn is_geometry_column(column: &ColumnInfo) -> bool {
    column.data_type.eq_ignore_ascii_case("USER-DEFINED") || column.name == "geom"
}

fn feature_collection(features: Vec<(i64, JsonValue)>) -> JsonValue {
    let features: Vec<JsonValue> = features
        .into_iter()
        .map(|(id, geometry)| {
            json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": { "id": id }
            })
        })
        .collect();
    json!({
        "type": "FeatureCollection",
        "features": features
    })
}

fn map_sqlx(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Connection(error.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
        }
    }

    #[test]
    fn test_geometry_columns_are_excluded_from_popups() {
        assert!(is_geometry_column(&column("geom", "USER-DEFINED")));
        assert!(is_geometry_column(&column("shape", "USER-DEFINED")));
        assert!(!is_geometry_column(&column("name", "text")));
        assert!(!is_geometry_column(&column("id", "integer")));
    }

    #[test]
    fn test_feature_collection_shape() {
        let collection = feature_collection(vec![
            (1, json!({"type": "Point", "coordinates": [13.4, 52.5]})),
            (2, json!({"type": "Point", "coordinates": [13.5, 52.6]})),
        ]);

        assert_eq!(collection["type"], "FeatureCollection");
        let features = collection["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["type"], "Feature");
        assert_eq!(features[0]["properties"]["id"], 1);
        assert_eq!(features[1]["geometry"]["coordinates"][1], 52.6);
    }

    #[test]
    fn test_empty_feature_collection() {
        let collection = feature_collection(Vec::new());
        assert_eq!(collection["features"].as_array().unwrap().len(), 0);
    }
}
