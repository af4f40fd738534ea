//! SQL Server provider over tiberius.
//!
//! # Module Structure
//! - `connection`: ADO.NET and `sqlserver://` connection string parsing
//! - `type_mapping`: Parameter binding and `ColumnData` decoding
//! - `schema_collection`: Column lookup via a probe query and `sys.columns`
//!
//! # SQL Server-Specific Behavior
//! - Placeholders are `@P1`, `@P2`, ...
//! - `CREATE TABLE` is guarded with `OBJECT_ID(..., N'U') IS NULL`
//! - Identity and computed columns count as database-generated
//! - Transactions are driven with `BEGIN TRANSACTION`/`COMMIT`/`ROLLBACK`

pub mod connection;
pub mod schema_collection;
pub mod type_mapping;


use super::{Provider, ProviderConnection, RowSink};
use crate::Result;
use crate::error::GenDaoError;
use crate::models::{ColumnMetadata, DatabaseType};
use crate::row::Row;
use crate::statement::{Dialect, Statement};
use crate::value::Value;
use async_trait::async_trait;
use futures::TryStreamExt as _;
use std::sync::Arc;
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

pub use type_mapping::decode_column;

type SqlServerClient = Client<Compat<TcpStream>>;

/// SQL Server backend binding.
pub struct SqlServerProvider {
    config: Config,
    database: Option<String>,
}

impl std::fmt::Debug for SqlServerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlServerProvider")
            .field("address", &self.config.get_addr())
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for SqlServerProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    fn dialect(&self) -> Dialect {
        Dialect::SQL_SERVER
    }

    async fn connect(&self) -> Result<Box<dyn ProviderConnection>> {
        let address = self.config.get_addr();
        tracing::debug!("Connecting to SQL Server at {}", address);

        let tcp = TcpStream::connect(address)
            .await
            .map_err(GenDaoError::connection_failed)?;
        tcp.set_nodelay(true)
            .map_err(GenDaoError::connection_failed)?;

        let client = Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(GenDaoError::connection_failed)?;

        Ok(Box::new(SqlServerConnection {
            client: Some(client),
        }))
    }
}

/// One open SQL Server connection.
pub struct SqlServerConnection {
    client: Option<SqlServerClient>,
}

impl std::fmt::Debug for SqlServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlServerConnection")
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl SqlServerConnection {
    fn client(&mut self) -> Result<&mut SqlServerClient> {
        self.client
            .as_mut()
            .ok_or_else(|| GenDaoError::configuration("SQL Server connection is already closed"))
    }

    async fn batch(client: &mut SqlServerClient, sql: &str) -> tiberius::Result<()> {
        client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }
}

#[async_trait]
impl ProviderConnection for SqlServerConnection {
    async fn describe(&mut self, table: &str) -> Result<Vec<ColumnMetadata>> {
        schema_collection::describe_table(self.client()?, table).await
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        let query = type_mapping::query(statement);
        let result = query
            .execute(self.client()?)
            .await
            .map_err(|e| GenDaoError::execution_failed("SQL Server statement failed", e))?;
        Ok(result.total())
    }

    async fn fetch_scalar(&mut self, statement: &Statement) -> Result<Value> {
        let query = type_mapping::query(statement);
        let row = query
            .query(self.client()?)
            .await
            .map_err(|e| GenDaoError::execution_failed("SQL Server query failed", e))?
            .into_row()
            .await
            .map_err(|e| GenDaoError::execution_failed("SQL Server query failed", e))?;

        match row {
            Some(row) => {
                let name = row
                    .columns()
                    .first()
                    .map_or_else(String::new, |c| c.name().to_string());
                match row.into_iter().next() {
                    Some(data) => decode_column(&name, data),
                    None => Ok(Value::Null),
                }
            }
            None => Ok(Value::Null),
        }
    }

    async fn fetch_rows(&mut self, statement: &Statement, sink: RowSink<'_>) -> Result<u64> {
        let query = type_mapping::query(statement);
        let mut rows = query
            .query(self.client()?)
            .await
            .map_err(|e| GenDaoError::execution_failed("SQL Server query failed", e))?
            .into_row_stream();

        let mut columns: Option<Arc<[String]>> = None;
        let mut count = 0u64;
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| GenDaoError::execution_failed("SQL Server query failed", e))?
        {
            let names = columns
                .get_or_insert_with(|| row.columns().iter().map(|c| c.name().to_string()).collect())
                .clone();
            let values = names
                .iter()
                .zip(row)
                .map(|(name, data)| decode_column(name, data))
                .collect::<Result<Vec<_>>>()?;
            sink(Row::new(names, values))?;
            count += 1;
        }
        Ok(count)
    }

    async fn execute_in_transaction(&mut self, statements: &[Statement]) -> Result<u64> {
        let client = self.client()?;
        Self::batch(client, "BEGIN TRANSACTION")
            .await
            .map_err(|e| GenDaoError::transaction_failed("Failed to begin transaction", e))?;

        let mut total = 0u64;
        for statement in statements {
            match type_mapping::query(statement).execute(&mut *client).await {
                Ok(result) => total += result.total(),
                Err(e) => {
                    tracing::warn!("SQL Server statement failed inside transaction, rolling back");
                    if let Err(rollback_error) = Self::batch(client, "ROLLBACK TRANSACTION").await {
                        tracing::warn!("Rollback failed: {}", rollback_error);
                    }
                    return Err(GenDaoError::execution_failed(
                        "SQL Server statement failed",
                        e,
                    ));
                }
            }
        }

        Self::batch(client, "COMMIT TRANSACTION")
            .await
            .map_err(|e| GenDaoError::transaction_failed("Failed to commit transaction", e))?;
        Ok(total)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.close().await.map_err(GenDaoError::connection_failed)?;
        }
        Ok(())
    }
}
