//! SQLite connection string handling.
//!
//! # Connection String Formats
//! - `sqlite:///path/to/database.db` or `sqlite://./relative.db`
//! - Bare file paths ending in `.db`, `.sqlite` or `.sqlite3`
//! - ADO.NET style `Data Source=people.db;Version=3;`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! An in-memory database lives only as long as one connection, and every DAO
//! call opens its own connection, so in-memory strings are only useful for
//! single-statement checks.

use super::SqliteProvider;
use crate::Result;
use crate::config::DaoConfig;
use crate::error::GenDaoError;
use crate::providers::helpers::{ado_pairs, ado_value};
use sqlx::ConnectOptions as _;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use url::Url;

impl SqliteProvider {
    /// Creates a SQLite provider from a connection string.
    ///
    /// # Errors
    /// Returns `Configuration` if the string is not a recognizable SQLite
    /// location. The database file is not touched until the first call.
    pub fn new(connection_string: &str, config: &DaoConfig) -> Result<Self> {
        let normalized = normalize_connection_string(connection_string)?;
        validate_sqlite_connection_string(&normalized)?;

        let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
            GenDaoError::configuration(format!("Invalid SQLite connection string: {}", e))
        })?;
        options = options.create_if_missing(config.create_if_missing);
        if !config.log_statements {
            options = options.disable_statement_logging();
        }

        Ok(Self {
            options,
            database_name: extract_database_name(&normalized),
        })
    }

    /// Checks if the provider points at an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_name == ":memory:"
    }

    /// File name (or `:memory:`) of the target database.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }
}

/// Normalizes any accepted form to a `sqlite:` URL.
pub fn normalize_connection_string(connection_string: &str) -> Result<String> {
    let trimmed = connection_string.trim();

    if trimmed == ":memory:" {
        return Ok("sqlite::memory:".to_string());
    }

    if trimmed.starts_with("sqlite:") {
        return Ok(trimmed.to_string());
    }

    if trimmed.contains('=') {
        let pairs = ado_pairs(trimmed);
        return match ado_value(&pairs, &["datasource", "filename"]) {
            Some(":memory:") => Ok("sqlite::memory:".to_string()),
            Some(path) if !path.is_empty() => Ok(format!("sqlite://{}", path)),
            _ => Err(GenDaoError::configuration(
                "SQLite connection string has no Data Source",
            )),
        };
    }

    Ok(format!("sqlite://{}", trimmed))
}

/// Validates a normalized SQLite connection string.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    if connection_string.contains(":memory:") || connection_string.contains("mode=memory") {
        return Ok(());
    }

    if let Some(path) = connection_string.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() {
            return Err(GenDaoError::configuration(
                "SQLite connection string has an empty path",
            ));
        }
        if path.contains("://") {
            return Err(GenDaoError::configuration(
                "Connection string must use sqlite:// scheme",
            ));
        }
        return Ok(());
    }

    if connection_string.starts_with("sqlite:")
        && let Ok(url) = Url::parse(connection_string)
        && url.scheme() == "sqlite"
    {
        return Ok(());
    }

    Err(GenDaoError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, Data Source, or :memory:",
    ))
}

/// Extracts database name from a normalized connection string.
fn extract_database_name(connection_string: &str) -> String {
    if connection_string.contains(":memory:") || connection_string.contains("mode=memory") {
        return ":memory:".to_string();
    }

    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);

    path.rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("main")
        .to_string()
}
