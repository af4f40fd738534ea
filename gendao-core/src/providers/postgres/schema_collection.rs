//! PostgreSQL column lookup.
//!
//! # System Catalogs
//! - `pg_attribute`: column list for the relation resolved by `to_regclass`
//! - `pg_index`: primary key membership (`indisprimary`)
//! - `pg_attrdef`: column defaults, for `nextval(...)` sequences behind `serial`

use crate::Result;
use crate::error::GenDaoError;
use crate::models::ColumnMetadata;
use crate::providers::helpers::merge_catalog;
use crate::statement::{Dialect, StatementBuilder};
use sqlx::postgres::PgConnection;
use sqlx::{Column as _, Executor as _, Row as _, Statement as _};

/// Catalog query returning key and generated flags per column.
const COLUMN_FLAGS_QUERY: &str = r"
    SELECT
        a.attname::text AS column_name,
        EXISTS (
            SELECT 1 FROM pg_index i
            WHERE i.indrelid = a.attrelid
              AND i.indisprimary
              AND a.attnum = ANY(i.indkey)
        ) AS is_primary_key,
        (
            a.attidentity IN ('a', 'd')
            OR COALESCE(pg_get_expr(d.adbin, d.adrelid), '') LIKE 'nextval(%'
        ) AS is_auto_increment
    FROM pg_attribute a
    LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    WHERE a.attrelid = to_regclass($1)
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attnum
";

/// Describes the columns of `table` in result-set order.
///
/// # Errors
/// `SchemaLookup` when the relation does not exist or the catalogs cannot be read.
pub(crate) async fn describe_table(
    conn: &mut PgConnection,
    table: &str,
) -> Result<Vec<ColumnMetadata>> {
    let probe = StatementBuilder::new(Dialect::POSTGRES).probe(table)?;
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

    let rows = sqlx::query(COLUMN_FLAGS_QUERY)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GenDaoError::schema_lookup(table, e))?;

    let mut catalog = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row
            .try_get("column_name")
            .map_err(|e| GenDaoError::schema_lookup(table, e))?;
        let is_primary_key: bool = row.try_get("is_primary_key").unwrap_or(false);
        let is_auto_increment: bool = row.try_get("is_auto_increment").unwrap_or(false);
        catalog.push(ColumnMetadata {
            name,
            is_primary_key,
            is_auto_increment,
        });
    }

    Ok(merge_catalog(names, &catalog))
}
