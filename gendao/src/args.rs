//! Parsing of command-line conditions, records and database selectors.

use gendao_core::{
    DatabaseType, GenDaoError, Operand, Result, Value, WhereCondition, WhereOperator,
};

/// Parses `"<column> <op> <value>"` into a condition.
///
/// - Scalars are read as JSON (`31`, `true`, `null`, `"31"`) and fall back
///   to plain text, so `name = Ted Mosby` compares against `"Ted Mosby"`.
/// - `BETWEEN` takes `<low> AND <high>`.
/// - `IN` takes a JSON array or a comma-separated list, optionally in
///   parentheses.
pub fn parse_condition(text: &str) -> Result<WhereCondition> {
    let text = text.trim();
    let (column, rest) = text.split_once(char::is_whitespace).ok_or_else(|| {
        GenDaoError::invalid_condition(format!(
            "Expected '<column> <operator> <value>', got '{}'",
            text
        ))
    })?;
    let rest = rest.trim_start();
    let (operator_text, operand_text) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(op, value)| (op, value.trim()));
    let operator: WhereOperator = operator_text.parse()?;

    let operand = match operator {
        WhereOperator::Between => {
            let (low, high) = split_between(operand_text)?;
            Operand::Range(parse_scalar(low), parse_scalar(high))
        }
        WhereOperator::In => Operand::List(parse_list(operand_text)),
        _ => Operand::Scalar(parse_scalar(operand_text)),
    };

    Ok(WhereCondition::new(column, operand, operator))
}

fn split_between(text: &str) -> Result<(&str, &str)> {
    // ASCII uppercasing keeps byte offsets valid for slicing
    let upper = text.to_ascii_uppercase();
    let index = upper.find(" AND ").ok_or_else(|| {
        GenDaoError::invalid_condition(format!(
            "BETWEEN expects '<low> AND <high>', got '{}'",
            text
        ))
    })?;
    Ok((text[..index].trim(), text[index + 5..].trim()))
}

fn parse_list(text: &str) -> Vec<Value> {
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(text) {
        return items
            .iter()
            .map(|item| Value::from_json(item).unwrap_or_else(|_| Value::Text(item.to_string())))
            .collect();
    }

    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_scalar)
        .collect()
}

/// Reads a JSON scalar, falling back to the raw text.
pub fn parse_scalar(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| Value::from_json(&json).ok())
        .unwrap_or_else(|| Value::Text(text.to_string()))
}

/// Parses a JSON object into a record.
pub fn parse_record(text: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str(text) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(GenDaoError::configuration(format!(
            "Record must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(GenDaoError::configuration(format!(
            "Record is not valid JSON: {}",
            e
        ))),
    }
}

/// Resolves the database type from an explicit selector or the URL scheme.
///
/// Anything that is not a recognized server URL is treated as SQLite.
pub fn resolve_database_type(selector: Option<&str>, database_url: &str) -> Result<DatabaseType> {
    if let Some(selector) = selector {
        return selector.parse();
    }

    let scheme = database_url
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase());
    let database_type = match scheme.as_deref() {
        Some("postgres" | "postgresql") => DatabaseType::Postgres,
        Some("mysql" | "mariadb") => DatabaseType::MySql,
        Some("mssql" | "sqlserver") => DatabaseType::SqlServer,
        _ => DatabaseType::Sqlite,
    };
    Ok(database_type)
}
