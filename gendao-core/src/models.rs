use crate::error::GenDaoError;
use crate::operators::WhereCondition;
use serde::{Deserialize, Serialize};

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    SqlServer,
    Sqlite,
    Postgres,
    MySql,
}

impl DatabaseType {
    /// All known database types, in display order.
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::SqlServer,
        DatabaseType::Sqlite,
        DatabaseType::Postgres,
        DatabaseType::MySql,
    ];

    /// Cargo feature that compiles the backend for this type.
    pub fn feature_name(self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "mssql",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Postgres => "postgresql",
            DatabaseType::MySql => "mysql",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::SqlServer => write!(f, "SQL Server"),
            DatabaseType::Sqlite => write!(f, "SQLite"),
            DatabaseType::Postgres => write!(f, "PostgreSQL"),
            DatabaseType::MySql => write!(f, "MySQL"),
        }
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = GenDaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" | "sqlserver" | "sql server" | "sql-server" | "mssql" => {
                Ok(DatabaseType::SqlServer)
            }
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(DatabaseType::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseType::MySql),
            _ => Err(GenDaoError::unsupported_provider(s)),
        }
    }
}

/// Per-column metadata discovered by schema introspection.
///
/// Produced fresh for every lookup; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
}

impl ColumnMetadata {
    /// Creates a plain (non-key, non-generated) column
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_primary_key: false,
            is_auto_increment: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }
}

/// Sort direction for ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = GenDaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(GenDaoError::configuration(format!(
                "Unknown sort direction '{}': expected asc or desc",
                other
            ))),
        }
    }
}

/// ORDER BY specification: one direction applied to an ordered column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub columns: Vec<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn ascending<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            direction: SortDirection::Descending,
        }
    }
}

/// Parameters of a read: projection, filter and ordering.
///
/// # Example
/// ```rust
/// use gendao_core::models::{OrderBy, ReadQuery};
/// use gendao_core::operators::WhereCondition;
///
/// let query = ReadQuery::new("person")
///     .with_columns(["id", "name"])
///     .with_condition(WhereCondition::greater_than("age", 30))
///     .with_order_by(OrderBy::descending(["age"]));
///
/// assert_eq!(query.columns.len(), 2);
/// assert!(query.order_by.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadQuery {
    pub table: String,
    /// Empty means `*`
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<WhereCondition>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
}

impl ReadQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order_by: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(mut self, condition: WhereCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = WhereCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }
}
