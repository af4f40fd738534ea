//! SQL Server column lookup.
//!
//! # System Views
//! - `sys.columns`: `is_identity` and `is_computed` mark database-generated columns
//! - `sys.indexes` / `sys.index_columns`: primary key membership

use super::SqlServerClient;
use crate::Result;
use crate::error::GenDaoError;
use crate::models::ColumnMetadata;
use crate::providers::helpers::merge_catalog;
use crate::statement::{Dialect, StatementBuilder};

const COLUMN_FLAGS_QUERY: &str = r"
    SELECT
        c.name AS column_name,
        CAST(CASE WHEN EXISTS (
            SELECT 1
            FROM sys.index_columns ic
            JOIN sys.indexes i ON i.object_id = ic.object_id AND i.index_id = ic.index_id
            WHERE i.is_primary_key = 1
              AND ic.object_id = c.object_id
              AND ic.column_id = c.column_id
        ) THEN 1 ELSE 0 END AS bit) AS is_primary_key,
        CAST(CASE WHEN c.is_identity = 1 OR c.is_computed = 1 THEN 1 ELSE 0 END AS bit)
            AS is_auto_increment
    FROM sys.columns c
    WHERE c.object_id = OBJECT_ID(@P1)
    ORDER BY c.column_id
";

/// Describes the columns of `table` in result-set order.
///
/// # Errors
/// `SchemaLookup` when the table does not exist or the system views cannot be read.
pub(crate) async fn describe_table(
    client: &mut SqlServerClient,
    table: &str,
) -> Result<Vec<ColumnMetadata>> {
    let probe = StatementBuilder::new(Dialect::SQL_SERVER).probe(table)?;
    tracing::debug!("Probing columns of {}", table);

    let mut stream = client
        .simple_query(probe.sql())
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?;
    let names: Vec<String> = stream
        .columns()
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?
        .map(|columns| columns.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    stream
        .into_results()
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?;

    let rows = client
        .query(COLUMN_FLAGS_QUERY, &[&table])
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?
        .into_first_result()
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?;

    let mut catalog = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: &str = row
            .try_get("column_name")
            .map_err(|e| GenDaoError::schema_lookup(table, e))?
            .unwrap_or_default();
        let is_primary_key: bool = row
            .try_get("is_primary_key")
            .map_err(|e| GenDaoError::schema_lookup(table, e))?
            .unwrap_or(false);
        let is_auto_increment: bool = row
            .try_get("is_auto_increment")
            .map_err(|e| GenDaoError::schema_lookup(table, e))?
            .unwrap_or(false);
        catalog.push(ColumnMetadata {
            name: name.to_string(),
            is_primary_key,
            is_auto_increment,
        });
    }

    Ok(merge_catalog(names, &catalog))
}
