//! SQLite column lookup.
//!
//! Column names and order come from preparing `SELECT * FROM <table> WHERE 1 = 0`;
//! key flags come from `PRAGMA table_info()`. A column declared
//! `INTEGER PRIMARY KEY` as the table's only key is an alias of the rowid and
//! therefore auto-generated.

use crate::Result;
use crate::error::GenDaoError;
use crate::models::ColumnMetadata;
use crate::providers::helpers::merge_catalog;
use crate::statement::{Dialect, StatementBuilder};
use crate::validation::split_qualified;
use sqlx::sqlite::SqliteConnection;
use sqlx::{Column as _, Executor as _, Row as _, Statement as _};

/// Describes the columns of `table` in result-set order.
///
/// # Errors
/// `SchemaLookup` when the table does not exist or cannot be read.
pub(crate) async fn describe_table(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnMetadata>> {
    let probe = StatementBuilder::new(Dialect::SQLITE).probe(table)?;
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

    let catalog = collect_table_info(conn, table).await?;
    Ok(merge_catalog(names, &catalog))
}

/// Builds the `PRAGMA table_info` statement for a possibly schema-qualified name.
pub(crate) fn table_info_query(table: &str) -> String {
    match split_qualified(table) {
        (Some(schema), name) => format!(
            "PRAGMA {}.table_info('{}')",
            schema,
            name.replace('\'', "''")
        ),
        (None, name) => format!("PRAGMA table_info('{}')", name.replace('\'', "''")),
    }
}

async fn collect_table_info(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnMetadata>> {
    let rows = sqlx::query(&table_info_query(table))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row
            .try_get("name")
            .map_err(|e| GenDaoError::schema_lookup(table, e))?;
        let data_type: String = row.try_get("type").unwrap_or_default();
        let pk: i64 = row.try_get("pk").unwrap_or(0);
        entries.push((name, data_type, pk));
    }

    let key_count = entries.iter().filter(|(_, _, pk)| *pk > 0).count();

    Ok(entries
        .into_iter()
        .map(|(name, data_type, pk)| ColumnMetadata {
            name,
            is_primary_key: pk > 0,
            is_auto_increment: pk > 0
                && key_count == 1
                && data_type.trim().eq_ignore_ascii_case("INTEGER"),
        })
        .collect())
}
