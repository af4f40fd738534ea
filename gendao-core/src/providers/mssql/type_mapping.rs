//! SQL Server parameter binding and `ColumnData` decoding.

use crate::Result;
use crate::error::GenDaoError;
use crate::statement::Statement;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tiberius::{ColumnData, FromSql, Query};

/// Builds a tiberius query with the statement's values bound as `@P1..@Pn`.
pub(crate) fn query(statement: &Statement) -> Query<'_> {
    let mut query = Query::new(statement.sql());
    for value in statement.bound_values() {
        match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Bytes(v) => query.bind(v.clone()),
            Value::Timestamp(v) => query.bind(*v),
        }
    }
    query
}

fn temporal<'a, T: FromSql<'a>>(column: &str, data: &'a ColumnData<'static>) -> Result<Option<T>> {
    T::from_sql(data).map_err(|e| GenDaoError::decode(column, e.to_string()))
}

/// Decodes one cell of a SQL Server row.
///
/// # Errors
/// `Decode` when a temporal value cannot be converted.
pub fn decode_column(column: &str, data: ColumnData<'static>) -> Result<Value> {
    let value = match &data {
        ColumnData::U8(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(Value::Int),
        ColumnData::F32(v) => v.map(|v| Value::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(Value::Float),
        ColumnData::Bit(v) => v.map(Value::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| Value::Text(s.to_string())),
        ColumnData::Guid(v) => v.as_ref().map(|g| Value::Text(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| Value::Bytes(b.to_vec())),
        ColumnData::Numeric(v) => v.as_ref().map(|n| Value::Text(n.to_string())),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| Value::Text(x.clone().into_owned().into_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(column, &data)?.map(Value::Timestamp)
        }
        ColumnData::DateTimeOffset(_) => {
            temporal::<DateTime<Utc>>(column, &data)?.map(|dt| Value::Timestamp(dt.naive_utc()))
        }
        ColumnData::Date(_) => temporal::<NaiveDate>(column, &data)?
            .map(|d| Value::Timestamp(d.and_time(NaiveTime::MIN))),
        ColumnData::Time(_) => {
            temporal::<NaiveTime>(column, &data)?.map(|t| Value::Text(t.to_string()))
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
