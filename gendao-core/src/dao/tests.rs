//! DAO tests against a scripted in-process provider.
//!
//! The mock records every statement it is asked to run and every lifecycle
//! event, which makes the connection-per-call contract observable without a
//! database.

use super::*;
use crate::config::MissingFieldPolicy;
use crate::models::OrderBy;
use crate::providers::RowSink;
use crate::record;
use crate::statement::Dialect;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Connect,
    Describe(String),
    Execute(String),
    Scalar(String),
    Rows(String),
    Transaction(Vec<String>),
    Close,
}

#[derive(Debug, Default)]
struct Script {
    columns: Vec<ColumnMetadata>,
    rows: Vec<Vec<Value>>,
    scalar: Option<Value>,
    affected: u64,
    fail_execute: bool,
}

#[derive(Debug, Default)]
struct MockProvider {
    script: Script,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockProvider {
    fn people() -> Self {
        Self {
            script: Script {
                columns: vec![
                    ColumnMetadata::new("id").primary_key().auto_increment(),
                    ColumnMetadata::new("name"),
                    ColumnMetadata::new("age"),
                ],
                rows: vec![
                    vec![Value::Int(1), Value::from("Steve"), Value::Int(31)],
                    vec![Value::Int(2), Value::from("Joe"), Value::Int(25)],
                ],
                scalar: Some(Value::Int(2)),
                affected: 1,
                fail_execute: false,
            },
            events: Arc::default(),
        }
    }

    fn events(&self) -> Arc<Mutex<Vec<Event>>> {
        Arc::clone(&self.events)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn dialect(&self) -> Dialect {
        Dialect::default()
    }

    async fn connect(&self) -> Result<Box<dyn ProviderConnection>> {
        self.events.lock().unwrap().push(Event::Connect);
        Ok(Box::new(MockConnection {
            columns: self.script.columns.clone(),
            rows: self.script.rows.clone(),
            scalar: self.script.scalar.clone(),
            affected: self.script.affected,
            fail_execute: self.script.fail_execute,
            events: Arc::clone(&self.events),
        }))
    }
}

#[derive(Debug)]
struct MockConnection {
    columns: Vec<ColumnMetadata>,
    rows: Vec<Vec<Value>>,
    scalar: Option<Value>,
    affected: u64,
    fail_execute: bool,
    events: Arc<Mutex<Vec<Event>>>,
}

impl MockConnection {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn failure() -> GenDaoError {
        GenDaoError::execution_failed(
            "mock statement failed",
            std::io::Error::other("constraint violation"),
        )
    }
}

#[async_trait]
impl ProviderConnection for MockConnection {
    async fn describe(&mut self, table: &str) -> Result<Vec<ColumnMetadata>> {
        self.record(Event::Describe(table.to_string()));
        Ok(self.columns.clone())
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        self.record(Event::Execute(statement.sql().to_string()));
        if self.fail_execute {
            return Err(Self::failure());
        }
        Ok(self.affected)
    }

    async fn fetch_scalar(&mut self, statement: &Statement) -> Result<Value> {
        self.record(Event::Scalar(statement.sql().to_string()));
        Ok(self.scalar.clone().unwrap_or_default())
    }

    async fn fetch_rows(&mut self, statement: &Statement, sink: RowSink<'_>) -> Result<u64> {
        self.record(Event::Rows(statement.sql().to_string()));
        let names: Arc<[String]> = self.columns.iter().map(|c| c.name.clone()).collect();
        let mut count = 0;
        for values in &self.rows {
            sink(Row::new(Arc::clone(&names), values.clone()))?;
            count += 1;
        }
        Ok(count)
    }

    async fn execute_in_transaction(&mut self, statements: &[Statement]) -> Result<u64> {
        self.record(Event::Transaction(
            statements.iter().map(|s| s.sql().to_string()).collect(),
        ));
        if self.fail_execute {
            return Err(Self::failure());
        }
        Ok(self.affected * statements.len() as u64)
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Event::Close);
        Ok(())
    }
}

fn dao_with(provider: MockProvider, config: DaoConfig) -> (DataAccessObject, Arc<Mutex<Vec<Event>>>) {
    let events = provider.events();
    (DataAccessObject::with_provider(Arc::new(provider), config), events)
}

fn events(log: &Arc<Mutex<Vec<Event>>>) -> Vec<Event> {
    log.lock().unwrap().clone()
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_with_provider_exposes_type_and_config() {
    let config = DaoConfig::default().with_update_strategy(UpdateStrategy::PerColumnTransactional);
    let (dao, log) = dao_with(MockProvider::people(), config.clone());

    assert_eq!(dao.database_type(), DatabaseType::Sqlite);
    assert_eq!(dao.config(), &config);
    assert!(events(&log).is_empty(), "construction must not connect");
}

#[test]
fn test_dao_is_send_sync_clone() {
    fn assert_traits<T: Send + Sync + Clone>() {}
    assert_traits::<DataAccessObject>();
}

#[test]
fn test_unknown_backend_text_is_unsupported() {
    let err = "Oracle".parse::<DatabaseType>().unwrap_err();
    assert!(matches!(err, GenDaoError::UnsupportedProvider { .. }));
}

// =============================================================================
// Create / Insert Tests
// =============================================================================

#[tokio::test]
async fn test_create_table_runs_one_statement_per_connection() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    dao.create_table("person", "id INTEGER PRIMARY KEY, name TEXT", true)
        .await
        .unwrap();

    assert_eq!(
        events(&log),
        vec![
            Event::Connect,
            Event::Execute("CREATE TABLE IF NOT EXISTS person (id INTEGER PRIMARY KEY, name TEXT)".to_string()),
            Event::Close,
        ]
    );
}

#[tokio::test]
async fn test_insert_skips_autoincrement_columns() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let inserted = dao
        .insert_data("person", &record! { "id" => 99, "name" => "Steve", "age" => 31 })
        .await
        .unwrap();

    assert!(inserted);
    assert_eq!(
        events(&log),
        vec![
            Event::Connect,
            Event::Describe("person".to_string()),
            Event::Execute("INSERT INTO person (name, age) VALUES (@name, @age)".to_string()),
            Event::Close,
        ]
    );
}

#[tokio::test]
async fn test_insert_reports_zero_rows_as_false() {
    let mut provider = MockProvider::people();
    provider.script.affected = 0;
    let (dao, _log) = dao_with(provider, DaoConfig::default());

    let inserted = dao
        .insert_data("person", &record! { "name" => "Steve" })
        .await
        .unwrap();
    assert!(!inserted);
}

#[tokio::test]
async fn test_strict_fields_rejects_missing_column() {
    let config = DaoConfig::default().with_missing_fields(MissingFieldPolicy::Fail);
    let (dao, log) = dao_with(MockProvider::people(), config);

    let err = dao
        .insert_data("person", &record! { "name" => "Steve" })
        .await
        .unwrap_err();

    assert!(matches!(err, GenDaoError::UnmappedColumn { ref column, .. } if column == "age"));
    // Connection is dropped, never closed, and nothing executes
    let log = events(&log);
    assert!(!log.contains(&Event::Close));
    assert!(!log.iter().any(|e| matches!(e, Event::Execute(_))));
}

#[tokio::test]
async fn test_execution_failure_drops_connection() {
    let mut provider = MockProvider::people();
    provider.script.fail_execute = true;
    let (dao, log) = dao_with(provider, DaoConfig::default());

    let err = dao
        .insert_data("person", &record! { "name" => "Steve", "age" => 1 })
        .await
        .unwrap_err();

    assert!(matches!(err, GenDaoError::Execution { .. }));
    assert!(!events(&log).contains(&Event::Close));
}

#[tokio::test]
async fn test_invalid_table_fails_before_connecting() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let err = dao
        .insert_data("person; DROP TABLE x", &record! { "name" => "Steve" })
        .await
        .unwrap_err();

    assert!(matches!(err, GenDaoError::InvalidIdentifier { .. }));
    assert!(events(&log).is_empty());
}

// =============================================================================
// Read Tests
// =============================================================================

#[tokio::test]
async fn test_read_converts_rows_in_order() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());
    let query = ReadQuery::new("person")
        .with_condition(WhereCondition::greater_than("age", 20))
        .with_order_by(OrderBy::ascending(["id"]));

    let people: Vec<(i64, String)> = dao
        .read_data(&query, |row| Ok((row.get("id")?, row.get("name")?)))
        .await
        .unwrap();

    assert_eq!(
        people,
        vec![(1, "Steve".to_string()), (2, "Joe".to_string())]
    );
    assert_eq!(
        events(&log)[1],
        Event::Rows("SELECT * FROM person WHERE age > @where0_age ORDER BY id ASC".to_string())
    );
}

#[tokio::test]
async fn test_read_converter_error_stops_read() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());
    let mut calls = 0;

    let err = dao
        .read_data(&ReadQuery::new("person"), |row| {
            calls += 1;
            row.get::<i64>("missing")
        })
        .await
        .unwrap_err();

    assert_eq!(calls, 1);
    assert!(matches!(err, GenDaoError::Decode { .. }));
    assert!(!events(&log).contains(&Event::Close));
}

// =============================================================================
// Update Tests
// =============================================================================

#[tokio::test]
async fn test_single_statement_update_by_primary_key() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let affected = dao
        .update_data(
            "person",
            &record! { "id" => 1, "name" => "Steve", "age" => 32 },
            &[],
        )
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        events(&log)[2],
        Event::Execute(
            "UPDATE person SET name = @set_name, age = @set_age WHERE id = @pk_id".to_string()
        )
    );
}

#[tokio::test]
async fn test_single_statement_update_without_key_fails() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let err = dao
        .update_data("person", &record! { "name" => "Steve" }, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, GenDaoError::MissingPrimaryKey { .. }));
    assert!(!events(&log).iter().any(|e| matches!(e, Event::Execute(_))));
}

#[tokio::test]
async fn test_per_column_update_uses_one_transaction() {
    let config = DaoConfig::default().with_update_strategy(UpdateStrategy::PerColumnTransactional);
    let (dao, log) = dao_with(MockProvider::people(), config);

    let affected = dao
        .update_data(
            "person",
            &record! { "id" => 1, "name" => "Steve", "age" => 32 },
            &[],
        )
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let log = events(&log);
    let Event::Transaction(statements) = &log[2] else {
        panic!("expected a transaction, got {:?}", log[2]);
    };
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("UPDATE person SET name = @set_name WHERE (name != @set_name"));
    assert!(statements[1].ends_with("AND id = @pk_id"));
    assert_eq!(log[3], Event::Close);
}

#[tokio::test]
async fn test_per_column_update_requires_key_even_with_conditions() {
    let config = DaoConfig::default().with_update_strategy(UpdateStrategy::PerColumnTransactional);
    let (dao, log) = dao_with(MockProvider::people(), config);

    let err = dao
        .update_data(
            "person",
            &record! { "name" => "Steve", "age" => 32 },
            &[WhereCondition::equal("name", "Steve")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GenDaoError::MissingPrimaryKey { .. }));
    assert!(!events(&log).iter().any(|e| matches!(e, Event::Transaction(_))));
}

#[tokio::test]
async fn test_update_with_nothing_to_set_is_noop() {
    let mut provider = MockProvider::people();
    provider.script.columns = vec![ColumnMetadata::new("id").primary_key()];
    let (dao, log) = dao_with(provider, DaoConfig::default());

    let affected = dao
        .update_data("person", &record! { "id" => 1 }, &[])
        .await
        .unwrap();

    assert_eq!(affected, 0);
    assert_eq!(
        events(&log),
        vec![Event::Connect, Event::Describe("person".to_string()), Event::Close]
    );
}

// =============================================================================
// Delete / Count Tests
// =============================================================================

#[tokio::test]
async fn test_delete_requires_conditions_without_connecting() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let err = dao.delete_data("person", &[]).await.unwrap_err();

    assert!(matches!(err, GenDaoError::MissingConditions { .. }));
    assert!(events(&log).is_empty());
}

#[tokio::test]
async fn test_delete_returns_affected_rows() {
    let mut provider = MockProvider::people();
    provider.script.affected = 3;
    let (dao, log) = dao_with(provider, DaoConfig::default());

    let deleted = dao
        .delete_data("person", &[WhereCondition::like("name", "S%")])
        .await
        .unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(
        events(&log)[1],
        Event::Execute("DELETE FROM person WHERE name LIKE @where0_name".to_string())
    );
}

#[tokio::test]
async fn test_count_decodes_scalar() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let count = dao.get_count("person", &[]).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        events(&log),
        vec![
            Event::Connect,
            Event::Scalar("SELECT COUNT(*) FROM person".to_string()),
            Event::Close,
        ]
    );
}

#[tokio::test]
async fn test_count_rejects_non_integer() {
    let mut provider = MockProvider::people();
    provider.script.scalar = Some(Value::Bytes(vec![1]));
    let (dao, _log) = dao_with(provider, DaoConfig::default());

    let err = dao.get_count("person", &[]).await.unwrap_err();
    assert!(matches!(err, GenDaoError::Decode { .. }));
}

#[tokio::test]
async fn test_get_columns() {
    let (dao, log) = dao_with(MockProvider::people(), DaoConfig::default());

    let columns = dao.get_columns("person").await.unwrap();

    assert_eq!(columns.len(), 3);
    assert!(columns[0].is_auto_increment);
    assert_eq!(events(&log).last(), Some(&Event::Close));
}
