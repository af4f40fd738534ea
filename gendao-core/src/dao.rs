//! The provider-agnostic data access object.
//!
//! [`DataAccessObject`] is the public entry point: it holds a provider
//! binding resolved once at construction and performs each operation on a
//! connection of its own. Statements that do not depend on the table's
//! metadata are built before connecting, so invalid identifiers, empty
//! DELETE conditions and malformed operands fail without touching the
//! database.
//!
//! # Connection Lifecycle
//! Every call opens one connection, runs exactly one statement (or one
//! transaction for [`UpdateStrategy::PerColumnTransactional`]) and closes the
//! connection. Errors drop the connection instead of closing it gracefully.
//!
//! # Example
//! ```rust,no_run
//! use gendao_core::{DataAccessObject, DatabaseType, ReadQuery, WhereCondition, record};
//!
//! # async fn example() -> gendao_core::Result<()> {
//! let dao = DataAccessObject::new("sqlite://people.db", DatabaseType::Sqlite)?;
//! dao.create_table(
//!     "person",
//!     "id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER",
//!     true,
//! )
//! .await?;
//! dao.insert_data("person", &record! { "name" => "Steve", "age" => 31 })
//!     .await?;
//!
//! let query = ReadQuery::new("person").with_condition(WhereCondition::greater_than("age", 30));
//! let names: Vec<String> = dao.read_data(&query, |row| row.get("name")).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{DaoConfig, UpdateStrategy};
use crate::error::{GenDaoError, Result};
use crate::mapper::Record;
use crate::models::{ColumnMetadata, DatabaseType, ReadQuery};
use crate::operators::WhereCondition;
use crate::providers::{Provider, ProviderConnection, resolve_provider};
use crate::row::Row;
use crate::statement::{Statement, StatementBuilder};
use crate::validation::validate_identifier;
use crate::value::FromValue;
use std::sync::Arc;

/// Record accepted by the write operations.
pub type RecordRef<'a> = &'a (dyn Record + Sync);

/// Provider-agnostic CRUD access to one database.
#[derive(Clone)]
pub struct DataAccessObject {
    provider: Arc<dyn Provider>,
    config: DaoConfig,
    builder: StatementBuilder,
}

impl std::fmt::Debug for DataAccessObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccessObject")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DataAccessObject {
    /// Creates a DAO with the default configuration.
    ///
    /// # Errors
    /// - `UnsupportedProvider` if `database_type` was not compiled in
    /// - `Configuration` if the connection string is malformed
    pub fn new(connection_string: &str, database_type: DatabaseType) -> Result<Self> {
        Self::with_config(connection_string, database_type, DaoConfig::default())
    }

    /// Creates a DAO with an explicit configuration.
    ///
    /// No connection is opened here.
    ///
    /// # Errors
    /// Same as [`DataAccessObject::new`].
    pub fn with_config(
        connection_string: &str,
        database_type: DatabaseType,
        config: DaoConfig,
    ) -> Result<Self> {
        let provider = resolve_provider(connection_string, database_type, &config)?;
        Ok(Self::with_provider(provider, config))
    }

    /// Creates a DAO over an already resolved provider.
    pub fn with_provider(provider: Arc<dyn Provider>, config: DaoConfig) -> Self {
        let builder =
            StatementBuilder::new(provider.dialect()).with_missing_fields(config.missing_fields);
        tracing::debug!(
            "Created {} data access object ({})",
            provider.database_type(),
            config
        );
        Self {
            provider,
            config,
            builder,
        }
    }

    /// The backend this DAO talks to.
    pub fn database_type(&self) -> DatabaseType {
        self.provider.database_type()
    }

    /// The configuration in effect.
    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    async fn open(&self) -> Result<Box<dyn ProviderConnection>> {
        self.provider.connect().await
    }

    /// Closes a connection after a successful call. A failed close does not
    /// fail the call whose work already completed.
    async fn release(mut conn: Box<dyn ProviderConnection>) {
        if let Err(e) = conn.close().await {
            tracing::warn!("Failed to close connection: {}", e);
        }
    }

    fn log_statement(statement: &Statement) {
        tracing::debug!(
            "Executing: {} ({} parameters)",
            statement.sql(),
            statement.params().len()
        );
    }

    /// Creates a table from verbatim column definitions.
    ///
    /// With `if_not_exists` an existing table is left untouched; without it
    /// the database's "already exists" error is returned as `Execution`.
    ///
    /// # Errors
    /// `InvalidIdentifier`, `Connection` or `Execution`.
    pub async fn create_table(
        &self,
        table: &str,
        column_defs: &str,
        if_not_exists: bool,
    ) -> Result<()> {
        let statement = self.builder.create_table(table, column_defs, if_not_exists)?;

        let mut conn = self.open().await?;
        Self::log_statement(&statement);
        conn.execute(&statement).await?;
        Self::release(conn).await;

        tracing::info!("Ensured table {} exists", table);
        Ok(())
    }

    /// Column metadata for `table`, in result-set order.
    ///
    /// # Errors
    /// `InvalidIdentifier`, `Connection` or `SchemaLookup`.
    pub async fn get_columns(&self, table: &str) -> Result<Vec<ColumnMetadata>> {
        validate_identifier(table)?;

        let mut conn = self.open().await?;
        let columns = conn.describe(table).await?;
        Self::release(conn).await;
        Ok(columns)
    }

    /// Inserts one record; autoincrement columns are left to the database.
    ///
    /// Returns whether at least one row was affected.
    ///
    /// # Errors
    /// `SchemaLookup` for unknown tables, `UnmappedColumn` under
    /// [`MissingFieldPolicy::Fail`](crate::config::MissingFieldPolicy::Fail),
    /// `Execution` for constraint violations.
    pub async fn insert_data(&self, table: &str, record: RecordRef<'_>) -> Result<bool> {
        validate_identifier(table)?;

        let mut conn = self.open().await?;
        let columns = conn.describe(table).await?;
        let statement = self.builder.insert(table, &columns, record)?;
        Self::log_statement(&statement);
        let affected = conn.execute(&statement).await?;
        Self::release(conn).await;

        tracing::debug!("Inserted {} row(s) into {}", affected, table);
        Ok(affected > 0)
    }

    /// Runs a SELECT and converts each row while the connection is open.
    ///
    /// The converter sees rows in result order; its first error stops the
    /// read and is returned unchanged.
    ///
    /// # Errors
    /// `InvalidIdentifier`, `InvalidCondition`, `Connection`, `Execution`,
    /// `Decode`, or whatever the converter returns.
    pub async fn read_data<T, F>(&self, query: &ReadQuery, mut converter: F) -> Result<Vec<T>>
    where
        T: Send,
        F: FnMut(&Row) -> Result<T> + Send,
    {
        let statement = self.builder.select(query)?;

        let mut conn = self.open().await?;
        Self::log_statement(&statement);
        let mut converted = Vec::new();
        let count = conn
            .fetch_rows(&statement, &mut |row| {
                converted.push(converter(&row)?);
                Ok(())
            })
            .await?;
        Self::release(conn).await;

        tracing::debug!("Read {} row(s) from {}", count, query.table);
        Ok(converted)
    }

    /// Updates rows from a record under the configured [`UpdateStrategy`].
    ///
    /// Without `conditions` the rows are matched by primary key values taken
    /// from the record. Returns the number of rows affected; a table with no
    /// settable columns yields 0 without executing anything.
    ///
    /// # Errors
    /// `MissingPrimaryKey` when no conditions are given and the key cannot
    /// be resolved (always required by the per-column strategy), plus the
    /// errors of [`DataAccessObject::insert_data`]. A failing statement under
    /// the per-column strategy rolls back every change of the call.
    pub async fn update_data(
        &self,
        table: &str,
        record: RecordRef<'_>,
        conditions: &[WhereCondition],
    ) -> Result<u64> {
        validate_identifier(table)?;

        let mut conn = self.open().await?;
        let columns = conn.describe(table).await?;

        let affected = match self.config.update_strategy {
            UpdateStrategy::SingleStatement => {
                match self.builder.update(table, &columns, record, conditions)? {
                    Some(statement) => {
                        Self::log_statement(&statement);
                        conn.execute(&statement).await?
                    }
                    None => {
                        tracing::debug!("Nothing to update in {}", table);
                        0
                    }
                }
            }
            UpdateStrategy::PerColumnTransactional => {
                let statements =
                    self.builder
                        .per_column_updates(table, &columns, record, conditions)?;
                if statements.is_empty() {
                    tracing::debug!("Nothing to update in {}", table);
                    0
                } else {
                    statements.iter().for_each(Self::log_statement);
                    conn.execute_in_transaction(&statements).await?
                }
            }
        };
        Self::release(conn).await;

        tracing::debug!("Updated {} row(s) in {}", affected, table);
        Ok(affected)
    }

    /// Deletes the rows matching every condition.
    ///
    /// # Errors
    /// `MissingConditions` when `conditions` is empty; no connection is
    /// opened in that case.
    pub async fn delete_data(&self, table: &str, conditions: &[WhereCondition]) -> Result<u64> {
        let statement = self.builder.delete(table, conditions)?;

        let mut conn = self.open().await?;
        Self::log_statement(&statement);
        let affected = conn.execute(&statement).await?;
        Self::release(conn).await;

        tracing::debug!("Deleted {} row(s) from {}", affected, table);
        Ok(affected)
    }

    /// Counts the rows matching every condition (all rows when empty).
    ///
    /// # Errors
    /// `InvalidIdentifier`, `InvalidCondition`, `Connection`, `Execution`,
    /// or `Decode` if the backend returns a non-integer count.
    pub async fn get_count(&self, table: &str, conditions: &[WhereCondition]) -> Result<i64> {
        let statement = self.builder.count(table, conditions)?;

        let mut conn = self.open().await?;
        Self::log_statement(&statement);
        let value = conn.fetch_scalar(&statement).await?;
        Self::release(conn).await;

        i64::from_value(&value).map_err(|message| GenDaoError::decode("COUNT(*)", message))
    }
}

#[cfg(test)]
mod tests;
