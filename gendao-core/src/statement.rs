//! Statement construction.
//!
//! Every statement the DAO executes is produced here as SQL text plus a list
//! of uniquely named [`BoundParameter`]s. Placeholders are rendered in the
//! provider's [`PlaceholderStyle`]; for positional `?` drivers the statement
//! also records the order in which placeholders reference parameters, since a
//! parameter used twice must be bound twice.
//!
//! Parameter naming:
//! - INSERT: the bare column name
//! - UPDATE SET: `set_<column>`
//! - WHERE: `where<index>_<column>`, with `_lo`/`_hi` for ranges and `_<j>` for lists
//! - implicit primary-key predicate: `pk_<column>`

use crate::config::MissingFieldPolicy;
use crate::error::{GenDaoError, Result};
use crate::mapper::{Record, bind_columns};
use crate::models::{ColumnMetadata, ReadQuery};
use crate::operators::{Operand, WhereCondition, WhereOperator};
use crate::validation::{validate_identifier, validate_identifiers};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// How a driver spells parameter markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderStyle {
    /// `@name`
    Named,
    /// `?1`, `?2`, ... (SQLite)
    QuestionNumbered,
    /// `$1`, `$2`, ... (PostgreSQL)
    DollarNumbered,
    /// `?` bound positionally (MySQL)
    Question,
    /// `@P1`, `@P2`, ... (SQL Server)
    AtP,
}

/// How `CREATE TABLE` is made conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateTableGuard {
    /// `CREATE TABLE IF NOT EXISTS`
    IfNotExists,
    /// `IF OBJECT_ID(N'<table>', N'U') IS NULL CREATE TABLE`
    ObjectId,
}

/// How an INSERT with no explicit columns is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyInsert {
    /// `INSERT INTO <table> DEFAULT VALUES`
    DefaultValues,
    /// `INSERT INTO <table> () VALUES ()`
    EmptyValueList,
}

/// The few places where backends need different statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    /// How parameters are written into statement text.
    pub placeholders: PlaceholderStyle,
    /// How `create_table` skips a table that already exists.
    pub create_guard: CreateTableGuard,
    /// Insert form used when every column is database-generated.
    pub empty_insert: EmptyInsert,
}

impl Dialect {
    /// `?1` placeholders, `IF NOT EXISTS`, `DEFAULT VALUES`.
    pub const SQLITE: Dialect = Dialect {
        placeholders: PlaceholderStyle::QuestionNumbered,
        create_guard: CreateTableGuard::IfNotExists,
        empty_insert: EmptyInsert::DefaultValues,
    };

    /// `$1` placeholders, `IF NOT EXISTS`, `DEFAULT VALUES`.
    pub const POSTGRES: Dialect = Dialect {
        placeholders: PlaceholderStyle::DollarNumbered,
        create_guard: CreateTableGuard::IfNotExists,
        empty_insert: EmptyInsert::DefaultValues,
    };

    /// Plain `?` placeholders, `IF NOT EXISTS`, `() VALUES ()`.
    pub const MYSQL: Dialect = Dialect {
        placeholders: PlaceholderStyle::Question,
        create_guard: CreateTableGuard::IfNotExists,
        empty_insert: EmptyInsert::EmptyValueList,
    };

    /// `@P1` placeholders, an `OBJECT_ID` guard, `DEFAULT VALUES`.
    pub const SQL_SERVER: Dialect = Dialect {
        placeholders: PlaceholderStyle::AtP,
        create_guard: CreateTableGuard::ObjectId,
        empty_insert: EmptyInsert::DefaultValues,
    };
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect {
            placeholders: PlaceholderStyle::Named,
            create_guard: CreateTableGuard::IfNotExists,
            empty_insert: EmptyInsert::DefaultValues,
        }
    }
}

/// A named placeholder paired with its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParameter {
    /// Placeholder name without its prefix.
    pub name: String,
    /// Value sent for every reference to `name`.
    pub value: Value,
}

impl BoundParameter {
    /// Pairs `name` with `value`.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A single SQL command with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<BoundParameter>,
    style: PlaceholderStyle,
    positional: Vec<usize>,
}

impl Statement {
    /// Statement text with dialect placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// One entry per distinct placeholder name, in first-use order.
    pub fn params(&self) -> &[BoundParameter] {
        &self.params
    }

    /// Placeholder style the text was written with.
    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Looks up a parameter value by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Values in the order a driver must bind them.
    ///
    /// Numbered and named styles bind each parameter once in declaration
    /// order. The `?` style binds once per placeholder occurrence.
    pub fn bound_values(&self) -> Vec<&Value> {
        match self.style {
            PlaceholderStyle::Question => self
                .positional
                .iter()
                .map(|&i| &self.params[i].value)
                .collect(),
            _ => self.params.iter().map(|p| &p.value).collect(),
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Accumulates SQL text and parameters for one statement.
struct SqlWriter {
    style: PlaceholderStyle,
    sql: String,
    params: Vec<BoundParameter>,
    positional: Vec<usize>,
}

impl SqlWriter {
    fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            sql: String::new(),
            params: Vec::new(),
            positional: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    /// Declares a parameter and writes its placeholder; returns its index.
    fn bind(&mut self, name: String, value: Value) -> usize {
        let index = self.params.len();
        self.params.push(BoundParameter { name, value });
        self.reference(index);
        index
    }

    /// Writes another placeholder for an already declared parameter.
    fn reference(&mut self, index: usize) {
        let number = index + 1;
        let _ = match self.style {
            PlaceholderStyle::Named => write!(self.sql, "@{}", self.params[index].name),
            PlaceholderStyle::QuestionNumbered => write!(self.sql, "?{}", number),
            PlaceholderStyle::DollarNumbered => write!(self.sql, "${}", number),
            PlaceholderStyle::AtP => write!(self.sql, "@P{}", number),
            PlaceholderStyle::Question => {
                self.sql.push('?');
                Ok(())
            }
        };
        self.positional.push(index);
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
            style: self.style,
            positional: self.positional,
        }
    }
}

/// Parameter-name fragment for a possibly qualified column.
fn param_stem(column: &str) -> String {
    column.replace('.', "_")
}

fn write_conditions(writer: &mut SqlWriter, conditions: &[WhereCondition]) -> Result<()> {
    for (index, condition) in conditions.iter().enumerate() {
        if index > 0 {
            writer.push(" AND ");
        }
        write_condition(writer, index, condition)?;
    }
    Ok(())
}

fn write_condition(writer: &mut SqlWriter, index: usize, condition: &WhereCondition) -> Result<()> {
    let column = condition.column.as_str();
    let stem = format!("where{}_{}", index, param_stem(column));
    let operator = condition.operator.as_sql();

    match (&condition.operand, condition.operator) {
        (Operand::Scalar(value), _) => {
            writer.push(column).push(" ").push(operator).push(" ");
            writer.bind(stem, value.clone());
        }
        (Operand::Range(low, high), WhereOperator::Between) => {
            writer.push(column).push(" BETWEEN ");
            writer.bind(format!("{}_lo", stem), low.clone());
            writer.push(" AND ");
            writer.bind(format!("{}_hi", stem), high.clone());
        }
        (Operand::List(values), WhereOperator::In) => {
            if values.is_empty() {
                return Err(GenDaoError::invalid_condition(format!(
                    "IN list for column '{}' is empty",
                    column
                )));
            }
            writer.push(column).push(" IN (");
            for (j, value) in values.iter().enumerate() {
                if j > 0 {
                    writer.push(", ");
                }
                writer.bind(format!("{}_{}", stem, j), value.clone());
            }
            writer.push(")");
        }
        (Operand::Range(..), other) => {
            return Err(GenDaoError::invalid_condition(format!(
                "a range operand requires BETWEEN, not {} (column '{}')",
                other, column
            )));
        }
        (Operand::List(_), other) => {
            return Err(GenDaoError::invalid_condition(format!(
                "a list operand requires IN, not {} (column '{}')",
                other, column
            )));
        }
    }
    Ok(())
}

fn validate_conditions(conditions: &[WhereCondition]) -> Result<()> {
    validate_identifiers(conditions.iter().map(|c| c.column.as_str()))
}

/// Columns written by UPDATE: neither key nor database-generated.
fn settable_columns(columns: &[ColumnMetadata]) -> impl Iterator<Item = &ColumnMetadata> {
    columns
        .iter()
        .filter(|c| !c.is_primary_key && !c.is_auto_increment)
}

/// Builds statement text and parameters for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder {
    dialect: Dialect,
    missing_fields: MissingFieldPolicy,
}

impl StatementBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            missing_fields: MissingFieldPolicy::default(),
        }
    }

    pub fn with_missing_fields(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_fields = policy;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn writer(&self) -> SqlWriter {
        SqlWriter::new(self.dialect.placeholders)
    }

    /// Zero-row probe whose result description lists the table's columns.
    pub fn probe(&self, table: &str) -> Result<Statement> {
        validate_identifier(table)?;
        let mut writer = self.writer();
        writer.push("SELECT * FROM ").push(table).push(" WHERE 1 = 0");
        Ok(writer.finish())
    }

    /// `CREATE TABLE [IF NOT EXISTS] <table> (<column_defs>)`.
    ///
    /// `column_defs` is passed through verbatim.
    pub fn create_table(
        &self,
        table: &str,
        column_defs: &str,
        if_not_exists: bool,
    ) -> Result<Statement> {
        validate_identifier(table)?;
        let mut writer = self.writer();
        match (if_not_exists, self.dialect.create_guard) {
            (false, _) => {
                writer.push("CREATE TABLE ");
            }
            (true, CreateTableGuard::IfNotExists) => {
                writer.push("CREATE TABLE IF NOT EXISTS ");
            }
            (true, CreateTableGuard::ObjectId) => {
                writer
                    .push("IF OBJECT_ID(N'")
                    .push(table)
                    .push("', N'U') IS NULL CREATE TABLE ");
            }
        }
        writer.push(table).push(" (").push(column_defs).push(")");
        Ok(writer.finish())
    }

    /// `INSERT INTO <table> (<cols>) VALUES (<params>)` over every column
    /// that is not database-generated.
    pub fn insert(
        &self,
        table: &str,
        columns: &[ColumnMetadata],
        record: &dyn Record,
    ) -> Result<Statement> {
        validate_identifier(table)?;
        let values = bind_columns(
            table,
            columns.iter().filter(|c| !c.is_auto_increment),
            record,
            self.missing_fields,
        )?;

        let mut writer = self.writer();
        writer.push("INSERT INTO ").push(table);

        if values.is_empty() {
            match self.dialect.empty_insert {
                EmptyInsert::DefaultValues => writer.push(" DEFAULT VALUES"),
                EmptyInsert::EmptyValueList => writer.push(" () VALUES ()"),
            };
            return Ok(writer.finish());
        }

        let column_list = values
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        writer.push(" (").push(&column_list).push(") VALUES (");
        for (i, param) in values.into_iter().enumerate() {
            if i > 0 {
                writer.push(", ");
            }
            writer.bind(param.name, param.value);
        }
        writer.push(")");
        Ok(writer.finish())
    }

    /// `SELECT <cols|*> FROM <table> [WHERE ...] [ORDER BY <cols> <dir>]`.
    pub fn select(&self, query: &ReadQuery) -> Result<Statement> {
        validate_identifier(&query.table)?;
        validate_identifiers(query.columns.iter().map(String::as_str))?;
        validate_conditions(&query.conditions)?;
        if let Some(order_by) = &query.order_by {
            validate_identifiers(order_by.columns.iter().map(String::as_str))?;
        }

        let mut writer = self.writer();
        writer.push("SELECT ");
        if query.columns.is_empty() {
            writer.push("*");
        } else {
            writer.push(&query.columns.join(", "));
        }
        writer.push(" FROM ").push(&query.table);

        if !query.conditions.is_empty() {
            writer.push(" WHERE ");
            write_conditions(&mut writer, &query.conditions)?;
        }

        if let Some(order_by) = &query.order_by
            && !order_by.columns.is_empty()
        {
            writer
                .push(" ORDER BY ")
                .push(&order_by.columns.join(", "))
                .push(" ")
                .push(order_by.direction.as_sql());
        }
        Ok(writer.finish())
    }

    /// `SELECT COUNT(*) FROM <table> [WHERE ...]`.
    pub fn count(&self, table: &str, conditions: &[WhereCondition]) -> Result<Statement> {
        validate_identifier(table)?;
        validate_conditions(conditions)?;

        let mut writer = self.writer();
        writer.push("SELECT COUNT(*) FROM ").push(table);
        if !conditions.is_empty() {
            writer.push(" WHERE ");
            write_conditions(&mut writer, conditions)?;
        }
        Ok(writer.finish())
    }

    /// `DELETE FROM <table> WHERE ...`; conditions are mandatory.
    pub fn delete(&self, table: &str, conditions: &[WhereCondition]) -> Result<Statement> {
        validate_identifier(table)?;
        if conditions.is_empty() {
            return Err(GenDaoError::MissingConditions {
                operation: "DELETE".to_string(),
            });
        }
        validate_conditions(conditions)?;

        let mut writer = self.writer();
        writer.push("DELETE FROM ").push(table).push(" WHERE ");
        write_conditions(&mut writer, conditions)?;
        Ok(writer.finish())
    }

    /// Resolves `pk = value` pairs from the record.
    ///
    /// Fails with `MissingPrimaryKey` when the table has no key or the record
    /// has no non-null value for a key column.
    fn primary_key_values(
        &self,
        table: &str,
        columns: &[ColumnMetadata],
        record: &dyn Record,
    ) -> Result<Vec<(String, Value)>> {
        let missing = || GenDaoError::MissingPrimaryKey {
            table: table.to_string(),
        };

        let keys: Vec<(String, Value)> = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| match record.field(&c.name) {
                Some(value) if !value.is_null() => Ok((c.name.clone(), value)),
                _ => Err(missing()),
            })
            .collect::<Result<_>>()?;

        if keys.is_empty() {
            return Err(missing());
        }
        Ok(keys)
    }

    fn write_key_predicate(writer: &mut SqlWriter, keys: &[(String, Value)]) {
        for (i, (column, value)) in keys.iter().enumerate() {
            if i > 0 {
                writer.push(" AND ");
            }
            writer.push(column).push(" = ");
            writer.bind(format!("pk_{}", param_stem(column)), value.clone());
        }
    }

    /// Single-statement update over all settable columns.
    ///
    /// Returns `None` when the table has nothing to set. Without explicit
    /// conditions the WHERE clause is primary-key equality taken from the
    /// record.
    pub fn update(
        &self,
        table: &str,
        columns: &[ColumnMetadata],
        record: &dyn Record,
        conditions: &[WhereCondition],
    ) -> Result<Option<Statement>> {
        validate_identifier(table)?;
        validate_conditions(conditions)?;

        let values = bind_columns(
            table,
            settable_columns(columns),
            record,
            self.missing_fields,
        )?;
        let keys = if conditions.is_empty() {
            self.primary_key_values(table, columns, record)?
        } else {
            Vec::new()
        };
        if values.is_empty() {
            return Ok(None);
        }

        let mut writer = self.writer();
        writer.push("UPDATE ").push(table).push(" SET ");
        for (i, param) in values.into_iter().enumerate() {
            if i > 0 {
                writer.push(", ");
            }
            writer.push(&param.name).push(" = ");
            writer.bind(format!("set_{}", param.name), param.value);
        }

        writer.push(" WHERE ");
        if conditions.is_empty() {
            Self::write_key_predicate(&mut writer, &keys);
        } else {
            write_conditions(&mut writer, conditions)?;
        }
        Ok(Some(writer.finish()))
    }

    /// One UPDATE per settable column, each guarded by a null-aware
    /// "value differs" test so unchanged columns are not rewritten.
    ///
    /// The primary key must resolve from the record even when explicit
    /// conditions replace the key predicate.
    pub fn per_column_updates(
        &self,
        table: &str,
        columns: &[ColumnMetadata],
        record: &dyn Record,
        conditions: &[WhereCondition],
    ) -> Result<Vec<Statement>> {
        validate_identifier(table)?;
        validate_conditions(conditions)?;

        let keys = self.primary_key_values(table, columns, record)?;
        let values = bind_columns(
            table,
            settable_columns(columns),
            record,
            self.missing_fields,
        )?;

        let mut statements = Vec::with_capacity(values.len());
        for param in values {
            let column = param.name;
            let mut writer = self.writer();
            writer.push("UPDATE ").push(table).push(" SET ").push(&column).push(" = ");
            let set = writer.bind(format!("set_{}", param_stem(&column)), param.value);

            writer.push(" WHERE (").push(&column).push(" != ");
            writer.reference(set);
            writer.push(" OR (").push(&column).push(" IS NULL AND ");
            writer.reference(set);
            writer.push(" IS NOT NULL) OR (").push(&column).push(" IS NOT NULL AND ");
            writer.reference(set);
            writer.push(" IS NULL)) AND ");

            if conditions.is_empty() {
                Self::write_key_predicate(&mut writer, &keys);
            } else {
                write_conditions(&mut writer, conditions)?;
            }
            statements.push(writer.finish());
        }
        Ok(statements)
    }
}
