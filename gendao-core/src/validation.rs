//! Identifier validation for caller-supplied table and column names.
//!
//! Values always travel as bound parameters, but identifiers are spliced into
//! statement text. Every table name, projected column, condition column and
//! ordering column passes through [`validate_identifier`] before a statement
//! is built. Column definitions given to `create_table` are DDL and are not
//! checked here.

use crate::error::{GenDaoError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Pre-compiled identifier pattern (singleton).
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
            .expect("Invalid identifier pattern")
    })
}

/// Checks that a name is a plain SQL identifier, optionally schema-qualified.
///
/// # Example
/// ```rust
/// use gendao_core::validation::validate_identifier;
///
/// assert!(validate_identifier("person").is_ok());
/// assert!(validate_identifier("dbo.person").is_ok());
/// assert!(validate_identifier("person; DROP TABLE person").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(GenDaoError::invalid_identifier(name))
    }
}

/// Validates every name in `names`, failing on the first bad one.
pub fn validate_identifiers<'a, I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().try_for_each(validate_identifier)
}

/// Splits an optionally qualified name into `(schema, table)`.
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests;
