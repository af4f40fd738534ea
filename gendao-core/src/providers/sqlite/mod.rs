//! SQLite provider.
//!
//! # Module Structure
//! - `connection`: Connection string parsing (URL, file path, `Data Source`, `:memory:`)
//! - `type_mapping`: Parameter binding and row value decoding
//! - `schema_collection`: Column lookup via a probe query and `PRAGMA table_info`
//!
//! # SQLite-Specific Behavior
//! - No pooling; each call opens the database file and closes it afterwards
//! - The file is created on first use unless `create_if_missing` is disabled
//! - Placeholders are numbered (`?1`, `?2`, ...)

pub mod connection;
pub mod schema_collection;
pub mod type_mapping;


use super::helpers::sqlx_connection;
use super::{Provider, ProviderConnection};
use crate::Result;
use crate::error::GenDaoError;
use crate::models::DatabaseType;
use crate::statement::Dialect;
use async_trait::async_trait;
use sqlx::Connection as _;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};

pub use type_mapping::decode_value;

/// SQLite backend binding.
pub struct SqliteProvider {
    options: SqliteConnectOptions,
    database_name: String,
}

impl std::fmt::Debug for SqliteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteProvider")
            .field("database_name", &self.database_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for SqliteProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn dialect(&self) -> Dialect {
        Dialect::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn ProviderConnection>> {
        tracing::debug!("Opening SQLite database {}", self.database_name);
        let conn = SqliteConnection::connect_with(&self.options)
            .await
            .map_err(GenDaoError::connection_failed)?;
        Ok(Box::new(SqliteProviderConnection::new(conn)))
    }
}

sqlx_connection! {
    /// One open SQLite connection.
    SqliteProviderConnection,
    connection = SqliteConnection,
    label = "SQLite",
    arguments = type_mapping::arguments,
    decode = type_mapping::decode_value,
    describe = schema_collection::describe_table,
}
