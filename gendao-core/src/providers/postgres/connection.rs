//! PostgreSQL connection string parsing.
//!
//! Accepts `postgres://` / `postgresql://` URLs and Npgsql-style
//! `Host=...;Port=...;Database=...;Username=...;Password=...` strings.
//! Parsing never opens a connection.

use super::PostgresProvider;
use crate::Result;
use crate::config::DaoConfig;
use crate::error::GenDaoError;
use crate::providers::helpers::{ado_pairs, ado_value};
use sqlx::ConnectOptions as _;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use url::Url;

impl PostgresProvider {
    /// Creates a PostgreSQL provider from a connection string.
    ///
    /// # Errors
    /// Returns `Configuration` if the string is malformed. Error messages
    /// never include the password.
    pub fn new(connection_string: &str, config: &DaoConfig) -> Result<Self> {
        let mut options = parse_connect_options(connection_string)?;
        if !config.log_statements {
            options = options.disable_statement_logging();
        }
        Ok(Self { options })
    }
}

/// Parses either accepted connection string form.
pub fn parse_connect_options(connection_string: &str) -> Result<PgConnectOptions> {
    let trimmed = connection_string.trim();
    if trimmed.contains("://") {
        validate_connection_string(trimmed)?;
        return PgConnectOptions::from_str(trimmed).map_err(|e| {
            GenDaoError::configuration(format!(
                "Invalid PostgreSQL connection string {}: {}",
                crate::error::redact_database_url(trimmed),
                e
            ))
        });
    }
    parse_key_value(trimmed)
}

/// Validates a PostgreSQL connection URL.
///
/// # Errors
/// Returns error if the scheme is not `postgres`/`postgresql` or no host is given
pub fn validate_connection_string(connection_string: &str) -> Result<()> {
    let url = Url::parse(connection_string).map_err(|e| {
        GenDaoError::configuration(format!("Invalid PostgreSQL connection string format: {}", e))
    })?;

    if !matches!(url.scheme(), "postgres" | "postgresql") {
        return Err(GenDaoError::configuration(
            "Connection string must use postgres:// or postgresql:// scheme",
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(GenDaoError::configuration(
            "Connection string must specify a host",
        ));
    }

    if url.port() == Some(0) {
        return Err(GenDaoError::configuration(
            "Invalid port number: must be greater than 0",
        ));
    }

    Ok(())
}

fn parse_key_value(connection_string: &str) -> Result<PgConnectOptions> {
    let pairs = ado_pairs(connection_string);
    let host = ado_value(&pairs, &["host", "server"]).ok_or_else(|| {
        GenDaoError::configuration("PostgreSQL connection string must specify Host")
    })?;

    let mut options = PgConnectOptions::new_without_pgpass().host(host);
    if let Some(port) = ado_value(&pairs, &["port"]) {
        let port: u16 = port
            .parse()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| GenDaoError::configuration(format!("Invalid port number: {}", port)))?;
        options = options.port(port);
    }
    if let Some(database) = ado_value(&pairs, &["database", "initialcatalog"]) {
        options = options.database(database);
    }
    if let Some(user) = ado_value(&pairs, &["username", "userid", "user", "uid"]) {
        options = options.username(user);
    }
    if let Some(password) = ado_value(&pairs, &["password", "pwd"]) {
        options = options.password(password);
    }
    Ok(options)
}
