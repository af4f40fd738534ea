//! SQLite parameter binding and value decoding.
//!
//! SQLite stores every value in one of four storage classes, and the class
//! is a property of the value rather than the column. Decoding therefore
//! follows the runtime type of each cell:
//!
//! | Storage class | Value           |
//! |---------------|-----------------|
//! | INTEGER       | `Value::Int`    |
//! | REAL          | `Value::Float`  |
//! | TEXT          | `Value::Text`   |
//! | BLOB          | `Value::Bytes`  |
//! | NULL          | `Value::Null`   |

use crate::Result;
use crate::error::GenDaoError;
use crate::providers::helpers::column_name;
use crate::statement::Statement;
use crate::value::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Arguments as _, Row as _, TypeInfo as _, ValueRef as _};

/// Arguments for `statement`; the connection is not consulted.
pub(crate) async fn arguments(
    _conn: &mut SqliteConnection,
    statement: &Statement,
) -> Result<SqliteArguments<'static>> {
    bind_values(statement)
}

/// Binds the statement's values in placeholder order.
pub(crate) fn bind_values(statement: &Statement) -> Result<SqliteArguments<'static>> {
    let mut args = SqliteArguments::default();
    for value in statement.bound_values() {
        let bound = match value {
            Value::Null => args.add(Option::<String>::None),
            Value::Bool(v) => args.add(*v),
            Value::Int(v) => args.add(*v),
            Value::Float(v) => args.add(*v),
            Value::Text(v) => args.add(v.clone()),
            Value::Bytes(v) => args.add(v.clone()),
            Value::Timestamp(v) => args.add(*v),
        };
        bound.map_err(|e| {
            GenDaoError::configuration(format!("Failed to bind {} parameter: {}", value.kind(), e))
        })?;
    }
    Ok(args)
}

/// Decodes the `index`th cell of a SQLite row.
///
/// # Errors
/// `Decode` when the cell cannot be read as any storage class.
pub fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| GenDaoError::decode(column_name(row, index), e.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let decoded = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" => row.try_get_unchecked::<i64, _>(index).map(Value::Int),
        "BOOLEAN" | "BOOL" => row.try_get_unchecked::<bool, _>(index).map(Value::Bool),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            row.try_get_unchecked::<f64, _>(index).map(Value::Float)
        }
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get_unchecked::<String, _>(index).map(Value::Text),
    };

    decoded
        .or_else(|_| row.try_get_unchecked::<String, _>(index).map(Value::Text))
        .or_else(|_| row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes))
        .map_err(|e| GenDaoError::decode(column_name(row, index), e.to_string()))
}
