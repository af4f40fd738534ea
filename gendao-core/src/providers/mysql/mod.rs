//! MySQL provider.
//!
//! # Module Structure
//! - `connection`: URL and key/value connection string parsing
//! - `type_mapping`: Parameter binding and row value decoding
//! - `schema_collection`: Column lookup via a probe query and `information_schema.COLUMNS`
//!
//! # MySQL-Specific Behavior
//! - Placeholders are plain `?`, bound in textual order
//! - A table without insertable columns is filled with `() VALUES ()`
//! - `AUTO_INCREMENT` and generated columns count as database-generated

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
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};

pub use type_mapping::decode_value;

/// MySQL backend binding.
pub struct MySqlProvider {
    options: MySqlConnectOptions,
}

impl std::fmt::Debug for MySqlProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlProvider")
            .field("host", &self.options.get_host())
            .field("port", &self.options.get_port())
            .field("database", &self.options.get_database())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for MySqlProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    fn dialect(&self) -> Dialect {
        Dialect::MYSQL
    }

    async fn connect(&self) -> Result<Box<dyn ProviderConnection>> {
        tracing::debug!(
            "Connecting to MySQL at {}:{}",
            self.options.get_host(),
            self.options.get_port()
        );
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(GenDaoError::connection_failed)?;
        Ok(Box::new(MySqlProviderConnection::new(conn)))
    }
}

sqlx_connection! {
    /// One open MySQL connection.
    MySqlProviderConnection,
    connection = MySqlConnection,
    label = "MySQL",
    arguments = type_mapping::arguments,
    decode = type_mapping::decode_value,
    describe = schema_collection::describe_table,
}
