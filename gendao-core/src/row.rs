//! Backend-neutral result rows handed to read converters.

use crate::error::{GenDaoError, Result};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// One result row.
///
/// Column names are shared between all rows of a result set. Lookup by name
/// tries an exact match first and falls back to a case-insensitive match,
/// since some engines fold unquoted identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Builds a row. Columns past the end of `values` read as absent.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.column_index(name).and_then(|i| self.values.get(i))
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Reads a column by name and converts it.
    ///
    /// # Errors
    /// `Decode` if the column is absent or the value does not convert.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .value(name)
            .ok_or_else(|| GenDaoError::decode(name, "no such column in result set"))?;
        T::from_value(value).map_err(|message| GenDaoError::decode(name, message))
    }

    /// Reads a column by position and converts it.
    pub fn get_at<T: FromValue>(&self, index: usize) -> Result<T> {
        let column = self
            .columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index));
        let value = self
            .values
            .get(index)
            .ok_or_else(|| GenDaoError::decode(&column, "column index out of range"))?;
        T::from_value(value).map_err(|message| GenDaoError::decode(column, message))
    }

    /// Renders the row as a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}
