//! Mapping of data objects onto table columns.
//!
//! A data object is anything implementing [`Record`]: it answers "what is the
//! value of column `c`?" or says it has no such field. Maps, serde-serializable
//! structs (through [`SerdeRecord`]) and structs declared with
//! [`impl_record!`](crate::impl_record) are supported out of the box.

use crate::config::MissingFieldPolicy;
use crate::error::{GenDaoError, Result};
use crate::models::ColumnMetadata;
use crate::statement::BoundParameter;
use crate::value::Value;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Field access contract for data objects.
pub trait Record {
    /// Returns the value for `column`, or `None` if the object has no such field.
    fn field(&self, column: &str) -> Option<Value>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, column: &str) -> Option<Value> {
        (**self).field(column)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn field(&self, column: &str) -> Option<Value> {
        (**self).field(column)
    }
}

fn lookup<'a, V: 'a, I>(entries: I, exact: Option<&'a V>, column: &str) -> Option<&'a V>
where
    I: IntoIterator<Item = (&'a String, &'a V)>,
{
    exact.or_else(|| {
        entries
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

impl Record for HashMap<String, Value> {
    fn field(&self, column: &str) -> Option<Value> {
        lookup(self.iter(), self.get(column), column).cloned()
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, column: &str) -> Option<Value> {
        lookup(self.iter(), self.get(column), column).cloned()
    }
}

fn json_field(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Value::Text(json.to_string())
        }
        scalar => Value::from_json(scalar).unwrap_or(Value::Null),
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, column: &str) -> Option<Value> {
        lookup(self.iter(), self.get(column), column).map(json_field)
    }
}

/// Record view over any `serde::Serialize` struct.
///
/// Nested arrays and objects are bound as their JSON text. Timestamps that
/// serialize as strings are bound as text.
///
/// # Example
/// ```rust
/// use gendao_core::mapper::{Record, SerdeRecord};
/// use gendao_core::value::Value;
///
/// #[derive(serde::Serialize)]
/// struct Person { id: i64, name: String }
///
/// let record = SerdeRecord::new(&Person { id: 1, name: "Steve".into() }).unwrap();
/// assert_eq!(record.field("name"), Some(Value::from("Steve")));
/// assert_eq!(record.field("age"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SerdeRecord {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl SerdeRecord {
    /// Serializes `value`, which must produce a JSON object.
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(GenDaoError::configuration(format!(
                "Record must serialize to a JSON object, got {}",
                other
            ))),
            Err(e) => Err(GenDaoError::configuration(format!(
                "Failed to serialize record: {}",
                e
            ))),
        }
    }

    pub fn from_map(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { fields }
    }
}

impl Record for SerdeRecord {
    fn field(&self, column: &str) -> Option<Value> {
        self.fields.field(column)
    }
}

/// Builds a `BTreeMap<String, Value>` record from `"column" => value` pairs.
///
/// ```rust
/// use gendao_core::{record, mapper::Record, value::Value};
///
/// let person = record! { "name" => "Steve", "age" => 31 };
/// assert_eq!(person.field("age"), Some(Value::Int(31)));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        ::std::collections::BTreeMap::<::std::string::String, $crate::value::Value>::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut record =
            ::std::collections::BTreeMap::<::std::string::String, $crate::value::Value>::new();
        $(
            record.insert(
                ::std::string::String::from($column),
                $crate::value::Value::from($value),
            );
        )+
        record
    }};
}

/// Implements [`Record`] for a struct by listing the fields that map to columns.
///
/// Field names match columns case-insensitively; each field type must
/// implement `Clone` and `Into<Value>`.
///
/// ```rust
/// use gendao_core::{impl_record, mapper::Record, value::Value};
///
/// #[derive(Clone)]
/// struct Person { id: i64, name: String, age: Option<i32> }
/// impl_record!(Person { id, name, age });
///
/// let p = Person { id: 3, name: "Sam".into(), age: None };
/// assert_eq!(p.field("Name"), Some(Value::from("Sam")));
/// assert_eq!(p.field("age"), Some(Value::Null));
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::mapper::Record for $ty {
            fn field(&self, column: &str) -> ::std::option::Option<$crate::value::Value> {
                $(
                    if column.eq_ignore_ascii_case(stringify!($field)) {
                        return ::std::option::Option::Some($crate::value::Value::from(
                            ::std::clone::Clone::clone(&self.$field),
                        ));
                    }
                )+
                ::std::option::Option::None
            }
        }
    };
}

/// Reads one value per column from `record`, in column order.
///
/// Parameters are named after their column. A column with no matching field
/// binds NULL under [`MissingFieldPolicy::BindNull`] and fails with
/// `UnmappedColumn` under [`MissingFieldPolicy::Fail`].
pub fn bind_columns<'a, I>(
    table: &str,
    columns: I,
    record: &dyn Record,
    policy: MissingFieldPolicy,
) -> Result<Vec<BoundParameter>>
where
    I: IntoIterator<Item = &'a ColumnMetadata>,
{
    columns
        .into_iter()
        .map(|column| {
            let value = match record.field(&column.name) {
                Some(value) => value,
                None => match policy {
                    MissingFieldPolicy::BindNull => {
                        tracing::debug!(
                            "No field for column '{}' of table '{}', binding NULL",
                            column.name,
                            table
                        );
                        Value::Null
                    }
                    MissingFieldPolicy::Fail => {
                        return Err(GenDaoError::UnmappedColumn {
                            table: table.to_string(),
                            column: column.name.clone(),
                        });
                    }
                },
            };
            Ok(BoundParameter::new(column.name.clone(), value))
        })
        .collect()
}
