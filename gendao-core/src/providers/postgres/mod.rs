//! PostgreSQL provider.
//!
//! # Module Structure
//! - `connection`: URL and key/value connection string parsing
//! - `type_mapping`: Parameter binding and row value decoding
//! - `schema_collection`: Column lookup via a probe query and `pg_attribute`
//!
//! # PostgreSQL-Specific Behavior
//! - Placeholders are `$1`, `$2`, ...
//! - NULL parameters are sent untyped so the server infers the column type
//! - Text parameters are converted to the type the server infers for them
//! - Identity columns and `serial` defaults count as database-generated

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
use sqlx::postgres::{PgConnectOptions, PgConnection};

pub use type_mapping::decode_value;

/// PostgreSQL backend binding.
pub struct PostgresProvider {
    options: PgConnectOptions,
}

impl std::fmt::Debug for PostgresProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Password is intentionally omitted
        f.debug_struct("PostgresProvider")
            .field("host", &self.options.get_host())
            .field("port", &self.options.get_port())
            .field("database", &self.options.get_database())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for PostgresProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn dialect(&self) -> Dialect {
        Dialect::POSTGRES
    }

    async fn connect(&self) -> Result<Box<dyn ProviderConnection>> {
        tracing::debug!(
            "Connecting to PostgreSQL at {}:{}",
            self.options.get_host(),
            self.options.get_port()
        );
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(GenDaoError::connection_failed)?;
        Ok(Box::new(PostgresProviderConnection::new(conn)))
    }
}

sqlx_connection! {
    /// One open PostgreSQL connection.
    PostgresProviderConnection,
    connection = PgConnection,
    label = "PostgreSQL",
    arguments = type_mapping::arguments,
    decode = type_mapping::decode_value,
    describe = schema_collection::describe_table,
}
