//! PostgreSQL parameter binding and value decoding.
//!
//! Parameters are sent in binary, so each one must match the type the
//! statement was parsed with. Non-text values declare the type of their Rust
//! value (`INT8`, `FLOAT8`, `BOOL`, `BYTEA`, `TIMESTAMP`) and rely on the
//! server's assignment casts. NULL is declared with OID 0.
//!
//! When a statement carries text, it is prepared first with text and NULL
//! parameters left untyped. Each text value is then converted to the type the
//! server inferred for its parameter, so `'2024-01-15 10:30:00'` fills a
//! `TIMESTAMP` column and `'1'` compares against an `INT4` one.
//!
//! Decoding maps the column's server type:
//! - `BOOL` -> `Bool`; `INT2`/`INT4`/`INT8`/`OID` -> `Int`; `FLOAT4`/`FLOAT8` -> `Float`
//! - `NUMERIC`, `TIME`, `UUID`, `JSON`, `JSONB` -> `Text` (lossless rendering; NUMERIC
//!   drops trailing fractional zeros)
//! - `TIMESTAMP`, `TIMESTAMPTZ` (as UTC), `DATE` (at midnight) -> `Timestamp`
//! - `BYTEA` -> `Bytes`; character types and anything else readable as text -> `Text`

use crate::Result;
use crate::error::GenDaoError;
use crate::providers::helpers::column_name;
use crate::statement::Statement;
use crate::value::{Value, parse_timestamp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgConnection, PgRow, PgTypeInfo, Postgres};
use sqlx::types::{BigDecimal, JsonValue, Uuid};
use sqlx::{Arguments as _, Either, Row as _, Statement as _, TypeInfo as _, ValueRef as _};
use std::str::FromStr;

/// A NULL parameter without a declared type.
struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl sqlx::Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> std::result::Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Arguments for `statement`, preparing it first when it carries text.
///
/// The prepared statement stays in the connection's statement cache, so the
/// execution that follows reuses it and the converted values line up.
pub(crate) async fn arguments(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<PgArguments> {
    let has_text = statement
        .bound_values()
        .iter()
        .any(|value| matches!(value, Value::Text(_)));
    if !has_text {
        return bind_values(statement, &[]);
    }

    let inferred = infer_parameter_types(conn, statement).await?;
    bind_values(statement, &inferred)
}

async fn infer_parameter_types(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<Vec<PgTypeInfo>> {
    let hints: Vec<PgTypeInfo> = statement.bound_values().into_iter().map(type_hint).collect();
    let prepared = sqlx::Executor::prepare_with(&mut *conn, statement.sql(), &hints)
        .await
        .map_err(|e| GenDaoError::execution_failed("PostgreSQL statement failed", e))?;

    Ok(match prepared.parameters() {
        Some(Either::Left(types)) => types.to_vec(),
        _ => Vec::new(),
    })
}

/// Declared parameter type for a value; text and NULL are left to the server.
fn type_hint(value: &Value) -> PgTypeInfo {
    match value {
        Value::Null | Value::Text(_) => <UntypedNull as sqlx::Type<Postgres>>::type_info(),
        Value::Bool(_) => <bool as sqlx::Type<Postgres>>::type_info(),
        Value::Int(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
        Value::Float(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
        Value::Bytes(_) => <Vec<u8> as sqlx::Type<Postgres>>::type_info(),
        Value::Timestamp(_) => <NaiveDateTime as sqlx::Type<Postgres>>::type_info(),
    }
}

/// Binds the statement's values in `$n` order.
///
/// `inferred` holds the server's parameter types by position. Text values
/// with an inferred type are converted to it; without one they bind as `TEXT`.
pub(crate) fn bind_values(statement: &Statement, inferred: &[PgTypeInfo]) -> Result<PgArguments> {
    let mut args = PgArguments::default();
    for (index, value) in statement.bound_values().into_iter().enumerate() {
        let bound = match value {
            Value::Null => args.add(UntypedNull),
            Value::Bool(v) => args.add(*v),
            Value::Int(v) => args.add(*v),
            Value::Float(v) => args.add(*v),
            Value::Text(v) => match inferred.get(index) {
                Some(type_info) => bind_text(&mut args, v, type_info),
                None => args.add(v.clone()),
            },
            Value::Bytes(v) => args.add(v.clone()),
            Value::Timestamp(v) => args.add(*v),
        };
        bound.map_err(|e| {
            GenDaoError::configuration(format!("Failed to bind {} parameter: {}", value.kind(), e))
        })?;
    }
    Ok(args)
}

fn bind_text(
    args: &mut PgArguments,
    text: &str,
    type_info: &PgTypeInfo,
) -> std::result::Result<(), BoxDynError> {
    let type_name = type_info.name();
    let invalid = || -> BoxDynError { format!("'{}' is not a valid {}", text, type_name).into() };
    let trimmed = text.trim();

    match type_name {
        "INT2" => args.add(trimmed.parse::<i16>().map_err(|_| invalid())?),
        "INT4" => args.add(trimmed.parse::<i32>().map_err(|_| invalid())?),
        "INT8" => args.add(trimmed.parse::<i64>().map_err(|_| invalid())?),
        "FLOAT4" => args.add(trimmed.parse::<f32>().map_err(|_| invalid())?),
        "FLOAT8" => args.add(trimmed.parse::<f64>().map_err(|_| invalid())?),
        "NUMERIC" => args.add(BigDecimal::from_str(trimmed).map_err(|_| invalid())?),
        "BOOL" => args.add(parse_bool(trimmed).ok_or_else(invalid)?),
        "TIMESTAMP" => args.add(parse_timestamp(trimmed).ok_or_else(invalid)?),
        "TIMESTAMPTZ" => {
            let instant = DateTime::parse_from_rfc3339(trimmed)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| parse_timestamp(trimmed).map(|ts| ts.and_utc()))
                .ok_or_else(invalid)?;
            args.add(instant)
        }
        "DATE" => args.add(
            parse_timestamp(trimmed)
                .map(|ts| ts.date())
                .ok_or_else(invalid)?,
        ),
        "TIME" => args.add(
            NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                .map_err(|_| invalid())?,
        ),
        "UUID" => args.add(Uuid::parse_str(trimmed).map_err(|_| invalid())?),
        "JSON" | "JSONB" => {
            args.add(serde_json::from_str::<JsonValue>(text).map_err(|_| invalid())?)
        }
        _ => args.add(text.to_string()),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Decodes the `index`th cell of a PostgreSQL row.
///
/// # Errors
/// `Decode` when the column type has no textual or numeric rendering.
pub fn decode_value(row: &PgRow, index: usize) -> Result<Value> {
    let decode_error = |e: sqlx::Error| GenDaoError::decode(column_name(row, index), e.to_string());

    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get_unchecked(index).map_err(decode_error)?),
        "INT2" => Value::Int(i64::from(
            row.try_get_unchecked::<i16, _>(index).map_err(decode_error)?,
        )),
        "INT4" => Value::Int(i64::from(
            row.try_get_unchecked::<i32, _>(index).map_err(decode_error)?,
        )),
        "INT8" => Value::Int(row.try_get_unchecked(index).map_err(decode_error)?),
        "OID" => Value::Int(i64::from(
            row.try_get_unchecked::<Oid, _>(index).map_err(decode_error)?.0,
        )),
        "FLOAT4" => Value::Float(f64::from(
            row.try_get_unchecked::<f32, _>(index).map_err(decode_error)?,
        )),
        "FLOAT8" => Value::Float(row.try_get_unchecked(index).map_err(decode_error)?),
        "NUMERIC" => Value::Text(render_numeric(
            &row.try_get_unchecked::<BigDecimal, _>(index)
                .map_err(decode_error)?,
        )),
        "BYTEA" => Value::Bytes(row.try_get_unchecked(index).map_err(decode_error)?),
        "TIMESTAMP" => Value::Timestamp(
            row.try_get_unchecked::<NaiveDateTime, _>(index)
                .map_err(decode_error)?,
        ),
        "TIMESTAMPTZ" => Value::Timestamp(
            row.try_get_unchecked::<DateTime<Utc>, _>(index)
                .map_err(decode_error)?
                .naive_utc(),
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
        "UUID" => Value::Text(
            row.try_get_unchecked::<Uuid, _>(index)
                .map_err(decode_error)?
                .to_string(),
        ),
        "JSON" | "JSONB" => Value::Text(
            row.try_get_unchecked::<JsonValue, _>(index)
                .map_err(decode_error)?
                .to_string(),
        ),
        other => {
            // TEXT, VARCHAR, BPCHAR, NAME, CITEXT and user-defined enums all
            // arrive as UTF-8 text.
            Value::Text(row.try_get_unchecked::<String, _>(index).map_err(|e| {
                GenDaoError::decode(
                    column_name(row, index),
                    format!("unsupported column type {}: {}", other, e),
                )
            })?)
        }
    };
    Ok(value)
}

/// Renders a NUMERIC without trailing fractional zeros.
///
/// The driver scales decoded values to whole base-10000 digits, so `12.34`
/// arrives as `12.3400`.
fn render_numeric(value: &BigDecimal) -> String {
    let text = value.to_string();
    if text.contains('.') && !text.contains(['e', 'E']) {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
