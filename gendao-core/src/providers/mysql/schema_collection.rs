//! MySQL column lookup via `information_schema.COLUMNS`.

use crate::Result;
use crate::error::GenDaoError;
use crate::models::ColumnMetadata;
use crate::providers::helpers::merge_catalog;
use crate::statement::{Dialect, StatementBuilder};
use crate::validation::split_qualified;
use sqlx::mysql::MySqlConnection;
use sqlx::{Column as _, Executor as _, Row as _, Statement as _};

// information_schema columns are reported with binary collations on some
// server versions, hence the casts.
const COLUMN_FLAGS_QUERY: &str = r"
    SELECT
        CAST(COLUMN_NAME AS CHAR) AS column_name,
        CAST(COLUMN_KEY AS CHAR) AS column_key,
        CAST(EXTRA AS CHAR) AS extra
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
      AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
";

/// Whether an `EXTRA` entry marks a column the server fills in itself.
///
/// `DEFAULT_GENERATED` only flags a default expression and stays writable.
pub(crate) fn is_generated(extra: &str) -> bool {
    let extra = extra.to_ascii_lowercase();
    extra.contains("auto_increment")
        || extra.contains("virtual generated")
        || extra.contains("stored generated")
}

/// Describes the columns of `table` in result-set order.
///
/// # Errors
/// `SchemaLookup` when the table does not exist or `information_schema`
/// cannot be read.
pub(crate) async fn describe_table(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<Vec<ColumnMetadata>> {
    let probe = StatementBuilder::new(Dialect::MYSQL).probe(table)?;
    tracing::debug!("Probing columns of {}", table);

    let names: Vec<String> = {
        let prepared = (&mut *conn)
            .prepare(probe.sql())
            .await
            .map_err(|e| GenDaoError::schema_lookup(table, e))?;
        prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    };

    let (schema, name) = split_qualified(table);
    let rows = sqlx::query(COLUMN_FLAGS_QUERY)
        .bind(schema)
        .bind(name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?;

    let mut catalog = Vec::with_capacity(rows.len());
    for row in &rows {
        let column_name: String = row
            .try_get("column_name")
            .map_err(|e| GenDaoError::schema_lookup(table, e))?;
        let column_key: String = row.try_get("column_key").unwrap_or_default();
        let extra: String = row.try_get("extra").unwrap_or_default();
        catalog.push(ColumnMetadata {
            name: column_name,
            is_primary_key: column_key.eq_ignore_ascii_case("PRI"),
            is_auto_increment: is_generated(&extra),
        });
    }

    Ok(merge_catalog(names, &catalog))
}
