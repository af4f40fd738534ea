//! MySQL connection string parsing.
//!
//! Accepts `mysql://` URLs and Connector/NET style
//! `Server=...;Port=...;Database=...;Uid=...;Pwd=...` strings.

use super::MySqlProvider;
use crate::Result;
use crate::config::DaoConfig;
use crate::error::GenDaoError;
use crate::providers::helpers::{ado_pairs, ado_value};
use sqlx::ConnectOptions as _;
use sqlx::mysql::MySqlConnectOptions;
use std::str::FromStr;
use url::Url;

impl MySqlProvider {
    /// Creates a MySQL provider from a connection string.
    ///
    /// # Errors
    /// Returns `Configuration` if the string is malformed.
    pub fn new(connection_string: &str, config: &DaoConfig) -> Result<Self> {
        let mut options = parse_connect_options(connection_string)?;
        if !config.log_statements {
            options = options.disable_statement_logging();
        }
        Ok(Self { options })
    }
}

/// Parses either accepted connection string form.
pub fn parse_connect_options(connection_string: &str) -> Result<MySqlConnectOptions> {
    let trimmed = connection_string.trim();
    if trimmed.contains("://") {
        validate_mysql_connection_string(trimmed)?;
        return MySqlConnectOptions::from_str(trimmed).map_err(|e| {
            GenDaoError::configuration(format!(
                "Invalid MySQL connection string {}: {}",
                crate::error::redact_database_url(trimmed),
                e
            ))
        });
    }
    parse_key_value(trimmed)
}

/// Validates a MySQL connection URL.
///
/// # Errors
/// Returns error if the scheme is not `mysql` or no host is given
pub fn validate_mysql_connection_string(connection_string: &str) -> Result<()> {
    let url = Url::parse(connection_string).map_err(|e| {
        GenDaoError::configuration(format!("Invalid MySQL connection string format: {}", e))
    })?;

    if url.scheme() != "mysql" {
        return Err(GenDaoError::configuration(
            "Connection string must use mysql:// scheme",
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

fn parse_key_value(connection_string: &str) -> Result<MySqlConnectOptions> {
    let pairs = ado_pairs(connection_string);
    let host = ado_value(&pairs, &["server", "host", "datasource"]).ok_or_else(|| {
        GenDaoError::configuration("MySQL connection string must specify Server")
    })?;

    let mut options = MySqlConnectOptions::new().host(host);
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
    if let Some(user) = ado_value(&pairs, &["uid", "userid", "user", "username"]) {
        options = options.username(user);
    }
    if let Some(password) = ado_value(&pairs, &["pwd", "password"]) {
        options = options.password(password);
    }
    Ok(options)
}
