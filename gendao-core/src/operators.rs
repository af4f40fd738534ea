//! Condition model and operator translation.
//!
//! The operator set is closed: anything that parses into a [`WhereOperator`]
//! has a SQL token, and text that does not parse fails with
//! `UnsupportedOperator` before a statement is ever built.

use crate::error::GenDaoError;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Comparison operators supported in WHERE clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WhereOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    Between,
    In,
}

impl WhereOperator {
    pub const ALL: [WhereOperator; 9] = [
        WhereOperator::Equal,
        WhereOperator::NotEqual,
        WhereOperator::GreaterThan,
        WhereOperator::LessThan,
        WhereOperator::GreaterThanOrEqual,
        WhereOperator::LessThanOrEqual,
        WhereOperator::Like,
        WhereOperator::Between,
        WhereOperator::In,
    ];

    pub fn as_sql(self) -> &'static str {
        to_sql_operator(self)
    }
}

/// Maps an operator to its SQL token.
pub fn to_sql_operator(operator: WhereOperator) -> &'static str {
    match operator {
        WhereOperator::Equal => "=",
        WhereOperator::NotEqual => "!=",
        WhereOperator::GreaterThan => ">",
        WhereOperator::LessThan => "<",
        WhereOperator::GreaterThanOrEqual => ">=",
        WhereOperator::LessThanOrEqual => "<=",
        WhereOperator::Like => "LIKE",
        WhereOperator::Between => "BETWEEN",
        WhereOperator::In => "IN",
    }
}

impl std::fmt::Display for WhereOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl std::str::FromStr for WhereOperator {
    type Err = GenDaoError;

    /// Accepts SQL tokens (`=`, `<>`, `like`) and variant names
    /// (`GreaterThanOrEqual`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "");
        let operator = match normalized.as_str() {
            "=" | "==" | "equal" | "eq" => WhereOperator::Equal,
            "!=" | "<>" | "notequal" | "ne" => WhereOperator::NotEqual,
            ">" | "greaterthan" | "gt" => WhereOperator::GreaterThan,
            "<" | "lessthan" | "lt" => WhereOperator::LessThan,
            ">=" | "greaterthanorequal" | "ge" | "gte" => WhereOperator::GreaterThanOrEqual,
            "<=" | "lessthanorequal" | "le" | "lte" => WhereOperator::LessThanOrEqual,
            "like" => WhereOperator::Like,
            "between" => WhereOperator::Between,
            "in" => WhereOperator::In,
            _ => return Err(GenDaoError::unsupported_operator(s.trim())),
        };
        Ok(operator)
    }
}

impl TryFrom<String> for WhereOperator {
    type Error = GenDaoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WhereOperator> for String {
    fn from(operator: WhereOperator) -> Self {
        operator.as_sql().to_string()
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Scalar(Value),
    /// Rendered as `BETWEEN lo AND hi`
    Range(Value, Value),
    /// Rendered as `IN (v1, v2, ...)`
    List(Vec<Value>),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Scalar(value)
    }
}

/// A single `column operator operand` filter. Conditions are ANDed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereCondition {
    pub column: String,
    pub operand: Operand,
    pub operator: WhereOperator,
}

impl WhereCondition {
    pub fn new(
        column: impl Into<String>,
        operand: impl Into<Operand>,
        operator: WhereOperator,
    ) -> Self {
        Self {
            column: column.into(),
            operand: operand.into(),
            operator,
        }
    }

    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, value.into(), WhereOperator::Equal)
    }

    pub fn not_equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, value.into(), WhereOperator::NotEqual)
    }

    pub fn greater_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, value.into(), WhereOperator::GreaterThan)
    }

    pub fn less_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, value.into(), WhereOperator::LessThan)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::new(column, pattern.into(), WhereOperator::Like)
    }

    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self {
            column: column.into(),
            operand: Operand::Range(low.into(), high.into()),
            operator: WhereOperator::Between,
        }
    }

    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            column: column.into(),
            operand: Operand::List(values.into_iter().map(Into::into).collect()),
            operator: WhereOperator::In,
        }
    }
}
