//! MySQL parameter binding and value decoding.
//!
//! | Column type                           | Value                  |
//! |---------------------------------------|------------------------|
//! | BOOLEAN (`TINYINT(1)`)                | `Bool`                 |
//! | TINYINT .. BIGINT, YEAR, BIT          | `Int`                  |
//! | BIGINT UNSIGNED above `i64::MAX`      | `Text`                 |
//! | FLOAT, DOUBLE                         | `Float`                |
//! | DECIMAL, TIME                         | `Text`                 |
//! | DATETIME, TIMESTAMP, DATE (midnight)  | `Timestamp`            |
//! | BINARY, VARBINARY, *BLOB              | `Bytes`                |
//! | CHAR, VARCHAR, *TEXT, ENUM, SET, JSON | `Text`                 |

use crate::Result;
use crate::error::GenDaoError;
use crate::providers::helpers::column_name;
use crate::statement::Statement;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::types::BigDecimal;
use sqlx::{Arguments as _, Row as _, TypeInfo as _, ValueRef as _};

/// Arguments for `statement`; the connection is not consulted.
pub(crate) async fn arguments(
    _conn: &mut MySqlConnection,
    statement: &Statement,
) -> Result<MySqlArguments> {
    bind_values(statement)
}

/// Binds the statement's values in textual `?` order.
pub(crate) fn bind_values(statement: &Statement) -> Result<MySqlArguments> {
    let mut args = MySqlArguments::default();
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

/// Decodes the `index`th cell of a MySQL row.
///
/// # Errors
/// `Decode` when the column type has no supported rendering.
pub fn decode_value(row: &MySqlRow, index: usize) -> Result<Value> {
    let decode_error = |e: sqlx::Error| GenDaoError::decode(column_name(row, index), e.to_string());

    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get_unchecked(index).map_err(decode_error)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::Int(row.try_get_unchecked(index).map_err(decode_error)?)
        }
        name if name.ends_with("UNSIGNED") || name == "YEAR" || name == "BIT" => {
            let unsigned: u64 = row.try_get_unchecked(index).map_err(decode_error)?;
            i64::try_from(unsigned).map_or_else(|_| Value::Text(unsigned.to_string()), Value::Int)
        }
        "FLOAT" => Value::Float(f64::from(
            row.try_get_unchecked::<f32, _>(index).map_err(decode_error)?,
        )),
        "DOUBLE" => Value::Float(row.try_get_unchecked(index).map_err(decode_error)?),
        "DECIMAL" => Value::Text(
            row.try_get_unchecked::<BigDecimal, _>(index)
                .map_err(decode_error)?
                .to_string(),
        ),
        "DATETIME" | "TIMESTAMP" => Value::Timestamp(
            row.try_get_unchecked::<NaiveDateTime, _>(index)
                .map_err(decode_error)?,
        ),
        "DATE" => Value::Timestamp(
            row.try_get_unchecked::<NaiveDate, _>(index)
                .map_err(decode_error)?
                .and_time(NaiveTime::MIN),
        ),
        "TIME" => Value::Text(
            row.try_get_unchecked::<NaiveTime, _>(index)
                .map_err(decode_error)?
                .to_string(),
        ),
        name if name.ends_with("BINARY") || name.ends_with("BLOB") => {
            Value::Bytes(row.try_get_unchecked(index).map_err(decode_error)?)
        }
        other => Value::Text(row.try_get_unchecked::<String, _>(index).map_err(|e| {
            GenDaoError::decode(
                column_name(row, index),
                format!("unsupported column type {}: {}", other, e),
            )
        })?),
    };
    Ok(value)
}
