//! DAO behaviour configuration.
//!
//! This module provides the `DaoConfig` struct and the policy enums it
//! carries. Connection details live in the connection string, never here.

use serde::{Deserialize, Serialize};

/// How `update_data` turns a data object into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// One `UPDATE ... SET` over all non-key columns
    #[default]
    SingleStatement,
    /// One `UPDATE` per changed column inside a single transaction
    PerColumnTransactional,
}

impl std::fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStrategy::SingleStatement => write!(f, "single_statement"),
            UpdateStrategy::PerColumnTransactional => write!(f, "per_column_transactional"),
        }
    }
}

/// What to do when a data object has no field for a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Bind NULL for the column
    #[default]
    BindNull,
    /// Fail with `UnmappedColumn` before anything executes
    Fail,
}

impl std::fmt::Display for MissingFieldPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingFieldPolicy::BindNull => write!(f, "bind_null"),
            MissingFieldPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Configuration for a `DataAccessObject`.
///
/// # Example
/// ```rust
/// use gendao_core::config::{DaoConfig, MissingFieldPolicy, UpdateStrategy};
///
/// let config = DaoConfig::new()
///     .with_update_strategy(UpdateStrategy::PerColumnTransactional)
///     .with_missing_fields(MissingFieldPolicy::Fail);
///
/// assert_eq!(config.update_strategy, UpdateStrategy::PerColumnTransactional);
/// assert!(config.create_if_missing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaoConfig {
    pub update_strategy: UpdateStrategy,
    pub missing_fields: MissingFieldPolicy,
    /// Create the SQLite database file on first connect
    pub create_if_missing: bool,
    /// Let the driver log every statement it runs
    pub log_statements: bool,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            update_strategy: UpdateStrategy::default(),
            missing_fields: MissingFieldPolicy::default(),
            create_if_missing: true,
            log_statements: false,
        }
    }
}

impl std::fmt::Display for DaoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DaoConfig(update_strategy={}, missing_fields={}, create_if_missing={}, log_statements={})",
            self.update_strategy, self.missing_fields, self.create_if_missing, self.log_statements
        )
    }
}

impl DaoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.update_strategy = strategy;
        self
    }

    pub fn with_missing_fields(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_fields = policy;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }
}
