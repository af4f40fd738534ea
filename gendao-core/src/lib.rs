//! Provider-agnostic CRUD data access for gendao.
//!
//! This crate maps plain data objects onto relational tables without
//! hand-written SQL. The column list of a table is discovered at runtime, so
//! callers only name the table, the record and optional conditions.
//!
//! # Guarantees
//! - Every value reaches the database as a bound parameter
//! - Caller-supplied identifiers are validated before any statement runs
//! - Each operation uses its own connection and releases it on every exit path
//! - Connection strings are never logged or included in errors unredacted
//!
//! # Architecture
//! - [`providers`]: one backend binding per [`DatabaseType`], selected by a
//!   factory and compiled in through cargo features
//! - [`statement`]: dialect-aware statement text and parameter lists
//! - [`mapper`]: the [`Record`] contract between data objects and columns
//! - [`dao`]: the [`DataAccessObject`] facade tying them together

pub mod config;
pub mod dao;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod models;
pub mod operators;
pub mod providers;
pub mod row;
pub mod statement;
pub mod validation;
pub mod value;

// Re-export commonly used types
pub use config::{DaoConfig, MissingFieldPolicy, UpdateStrategy};
pub use dao::DataAccessObject;
pub use error::{GenDaoError, Result};
pub use mapper::{Record, SerdeRecord};
pub use models::{ColumnMetadata, DatabaseType, OrderBy, ReadQuery, SortDirection};
pub use operators::{Operand, WhereCondition, WhereOperator, to_sql_operator};
pub use providers::{Provider, ProviderConnection, resolve_provider};
pub use row::Row;
pub use statement::{Dialect, PlaceholderStyle, Statement, StatementBuilder};
pub use value::{FromValue, Value};
