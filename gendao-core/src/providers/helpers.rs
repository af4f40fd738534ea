//! Shared helper utilities for providers.

use crate::models::ColumnMetadata;

/// Combines probe column names with catalog flags.
///
/// The probe decides which columns exist and their order. Catalog entries
/// are matched by exact name, then case-insensitively; a column the catalog
/// does not mention gets no flags.
pub(crate) fn merge_catalog(probe: Vec<String>, catalog: &[ColumnMetadata]) -> Vec<ColumnMetadata> {
    probe
        .into_iter()
        .map(|name| {
            let entry = catalog
                .iter()
                .find(|c| c.name == name)
                .or_else(|| catalog.iter().find(|c| c.name.eq_ignore_ascii_case(&name)));
            ColumnMetadata {
                is_primary_key: entry.is_some_and(|c| c.is_primary_key),
                is_auto_increment: entry.is_some_and(|c| c.is_auto_increment),
                name,
            }
        })
        .collect()
}

/// Splits an ADO.NET style `Key=Value;Key=Value` string.
///
/// Keys are lowercased with inner whitespace removed, so `User Id` and
/// `userid` compare equal. Empty segments are skipped.
pub(crate) fn ado_pairs(connection_string: &str) -> Vec<(String, &str)> {
    connection_string
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| {
            let key: String = key
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            (key, value.trim())
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// First value among `keys` in parsed ADO.NET pairs.
pub(crate) fn ado_value<'a>(pairs: &[(String, &'a str)], keys: &[&str]) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| keys.contains(&key.as_str()))
        .map(|(_, value)| *value)
}

/// Column names of a sqlx row, shared by every row of the result set.
#[cfg(any(feature = "sqlite", feature = "postgresql", feature = "mysql"))]
pub(crate) fn column_names<R: sqlx::Row>(row: &R) -> std::sync::Arc<[String]> {
    use sqlx::Column as _;
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Name of the `index`th column of a sqlx row, for error messages.
#[cfg(any(feature = "sqlite", feature = "postgresql", feature = "mysql"))]
pub(crate) fn column_name<R: sqlx::Row>(row: &R, index: usize) -> String {
    use sqlx::Column as _;
    row.columns()
        .get(index)
        .map_or_else(|| format!("#{}", index), |c| c.name().to_string())
}

/// Generates a `ProviderConnection` over a single sqlx connection.
///
/// # Parameters
///
/// - `$name`: the connection struct to define
/// - `$conn`: the sqlx connection type (e.g. `SqliteConnection`)
/// - `$label`: backend name for log and error messages
/// - `$arguments`: `async fn(&mut Conn, &Statement) -> Result<Arguments>` binding values
/// - `$decode`: `fn(&DbRow, usize) -> Result<Value>` reading one cell
/// - `$describe`: `async fn(&mut Conn, &str) -> Result<Vec<ColumnMetadata>>`
#[cfg(any(feature = "sqlite", feature = "postgresql", feature = "mysql"))]
macro_rules! sqlx_connection {
    (
        $(#[$meta:meta])*
        $name:ident,
        connection = $conn:ty,
        label = $label:literal,
        arguments = $arguments:path,
        decode = $decode:path,
        describe = $describe:path $(,)?
    ) => {
        $(#[$meta])*
        pub struct $name {
            conn: Option<$conn>,
        }

        impl $name {
            pub(crate) fn new(conn: $conn) -> Self {
                Self { conn: Some(conn) }
            }

            fn conn(&mut self) -> $crate::Result<&mut $conn> {
                self.conn.as_mut().ok_or_else(|| {
                    $crate::error::GenDaoError::configuration(concat!(
                        $label,
                        " connection is already closed"
                    ))
                })
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("open", &self.conn.is_some())
                    .finish()
            }
        }

        #[async_trait::async_trait]
        impl $crate::providers::ProviderConnection for $name {
            async fn describe(
                &mut self,
                table: &str,
            ) -> $crate::Result<Vec<$crate::models::ColumnMetadata>> {
                $describe(self.conn()?, table).await
            }

            async fn execute(
                &mut self,
                statement: &$crate::statement::Statement,
            ) -> $crate::Result<u64> {
                let conn = self.conn()?;
                let arguments = $arguments(&mut *conn, statement).await?;
                let result = sqlx::query_with(statement.sql(), arguments)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        $crate::error::GenDaoError::execution_failed(
                            concat!($label, " statement failed"),
                            e,
                        )
                    })?;
                Ok(result.rows_affected())
            }

            async fn fetch_scalar(
                &mut self,
                statement: &$crate::statement::Statement,
            ) -> $crate::Result<$crate::value::Value> {
                let conn = self.conn()?;
                let arguments = $arguments(&mut *conn, statement).await?;
                let row = sqlx::query_with(statement.sql(), arguments)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(|e| {
                        $crate::error::GenDaoError::execution_failed(
                            concat!($label, " query failed"),
                            e,
                        )
                    })?;
                match row {
                    Some(row) => $decode(&row, 0),
                    None => Ok($crate::value::Value::Null),
                }
            }

            async fn fetch_rows(
                &mut self,
                statement: &$crate::statement::Statement,
                sink: $crate::providers::RowSink<'_>,
            ) -> $crate::Result<u64> {
                use futures::TryStreamExt as _;

                let conn = self.conn()?;
                let arguments = $arguments(&mut *conn, statement).await?;
                let mut rows = sqlx::query_with(statement.sql(), arguments).fetch(&mut *conn);
                let mut columns: Option<std::sync::Arc<[String]>> = None;
                let mut count = 0u64;

                while let Some(row) = rows.try_next().await.map_err(|e| {
                    $crate::error::GenDaoError::execution_failed(concat!($label, " query failed"), e)
                })? {
                    let names = columns
                        .get_or_insert_with(|| $crate::providers::helpers::column_names(&row))
                        .clone();
                    let values = (0..names.len())
                        .map(|index| $decode(&row, index))
                        .collect::<$crate::Result<Vec<_>>>()?;
                    sink($crate::row::Row::new(names, values))?;
                    count += 1;
                }
                Ok(count)
            }

            async fn execute_in_transaction(
                &mut self,
                statements: &[$crate::statement::Statement],
            ) -> $crate::Result<u64> {
                use sqlx::Connection as _;

                let conn = self.conn()?;
                let mut prepared = Vec::with_capacity(statements.len());
                for statement in statements {
                    prepared.push((statement, $arguments(&mut *conn, statement).await?));
                }

                let mut tx = conn.begin().await.map_err(|e| {
                    $crate::error::GenDaoError::transaction_failed("Failed to begin transaction", e)
                })?;

                let mut total = 0u64;
                for (statement, arguments) in prepared {
                    match sqlx::query_with(statement.sql(), arguments)
                        .execute(&mut *tx)
                        .await
                    {
                        Ok(result) => total += result.rows_affected(),
                        Err(e) => {
                            tracing::warn!(
                                "{} statement failed inside transaction, rolling back",
                                $label
                            );
                            if let Err(rollback_error) = tx.rollback().await {
                                tracing::warn!("Rollback failed: {}", rollback_error);
                            }
                            return Err($crate::error::GenDaoError::execution_failed(
                                concat!($label, " statement failed"),
                                e,
                            ));
                        }
                    }
                }

                tx.commit().await.map_err(|e| {
                    $crate::error::GenDaoError::transaction_failed("Failed to commit transaction", e)
                })?;
                Ok(total)
            }

            async fn close(&mut self) -> $crate::Result<()> {
                use sqlx::Connection as _;

                if let Some(conn) = self.conn.take() {
                    conn.close()
                        .await
                        .map_err($crate::error::GenDaoError::connection_failed)?;
                }
                Ok(())
            }
        }
    };
}

#[cfg(any(feature = "sqlite", feature = "postgresql", feature = "mysql"))]
pub(crate) use sqlx_connection;
