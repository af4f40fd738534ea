//! SQLite end-to-end CRUD tests.
//!
//! This test suite covers:
//! - Table creation (idempotent and failing)
//! - Inserts that leave autoincrement keys to the database
//! - Reads with column lists, conditions and ordering
//! - Both update strategies, including rollback
//! - Counting and deleting with every operator family
//!
//! Each DAO call opens its own connection, so tests use temporary database
//! files rather than `:memory:`.

#![cfg(feature = "sqlite")]

use gendao_core::{
    DaoConfig, DataAccessObject, DatabaseType, GenDaoError, MissingFieldPolicy, OrderBy,
    ReadQuery, Result, Row, SerdeRecord, UpdateStrategy, Value, WhereCondition, WhereOperator,
    impl_record, record,
};
use serde::Serialize;
use tempfile::TempDir;

const PERSON_COLUMNS: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER";

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Person {
    id: i64,
    name: String,
    age: i64,
}

impl_record!(Person { id, name, age });

fn person(row: &Row) -> Result<Person> {
    Ok(Person {
        id: row.get("id")?,
        name: row.get("name")?,
        age: row.get("age")?,
    })
}

fn sample_people() -> Vec<Person> {
    [
        ("Ted Mosby", 31),
        ("Marshall Eriksen", 27),
        ("Lily Aldrin", 34),
        ("Barney Stinson", 38),
        ("Robin Scherbatsky", 33),
    ]
    .into_iter()
    .map(|(name, age)| Person {
        id: 0,
        name: name.to_string(),
        age,
    })
    .collect()
}

fn temp_dao(config: DaoConfig) -> (TempDir, DataAccessObject) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.db");
    let dao = DataAccessObject::with_config(path.to_str().unwrap(), DatabaseType::Sqlite, config)
        .unwrap();
    (dir, dao)
}

/// Creates the Person table and inserts the five sample people.
async fn seeded_dao(config: DaoConfig) -> (TempDir, DataAccessObject) {
    let (dir, dao) = temp_dao(config);
    dao.create_table("Person", PERSON_COLUMNS, true).await.unwrap();
    for p in sample_people() {
        assert!(dao.insert_data("Person", &p).await.unwrap());
    }
    (dir, dao)
}

async fn read_people(dao: &DataAccessObject) -> Vec<Person> {
    let query = ReadQuery::new("Person")
        .with_columns(["id", "name", "age"])
        .with_order_by(OrderBy::ascending(["id"]));
    dao.read_data(&query, person).await.unwrap()
}

// =============================================================================
// Create / Insert / Read Tests
// =============================================================================

#[tokio::test]
async fn test_round_trip_assigns_ids_in_order() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let people = read_people(&dao).await;

    assert_eq!(people.len(), 5);
    let ids: Vec<i64> = people.iter().map(|p| p.id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
    assert_eq!(people[0].name, "Ted Mosby");
    assert_eq!(people[4].age, 33);
}

#[tokio::test]
async fn test_create_table_is_idempotent() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    dao.create_table("Person", PERSON_COLUMNS, true).await.unwrap();

    assert_eq!(dao.get_count("Person", &[]).await.unwrap(), 5);
}

#[tokio::test]
async fn test_create_existing_table_without_guard_fails() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let err = dao
        .create_table("Person", PERSON_COLUMNS, false)
        .await
        .unwrap_err();
    assert!(matches!(err, GenDaoError::Execution { .. }));
}

#[tokio::test]
async fn test_get_columns_reports_autoincrement_key() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let columns = dao.get_columns("Person").await.unwrap();

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "name", "age"]);
    assert!(columns[0].is_primary_key && columns[0].is_auto_increment);
}

#[tokio::test]
async fn test_insert_serde_record() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    #[derive(Serialize)]
    struct NewPerson<'a> {
        name: &'a str,
        age: u8,
    }
    let record = SerdeRecord::new(&NewPerson {
        name: "Tracy McConnell",
        age: 35,
    })
    .unwrap();
    assert!(dao.insert_data("Person", &record).await.unwrap());

    let query = ReadQuery::new("Person").with_condition(WhereCondition::equal("age", 35));
    let people = dao.read_data(&query, person).await.unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].id, 6);
}

#[tokio::test]
async fn test_insert_missing_field_binds_null() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    dao.insert_data("Person", &record! { "name" => "No Age" })
        .await
        .unwrap();

    let query = ReadQuery::new("Person")
        .with_columns(["age"])
        .with_condition(WhereCondition::equal("name", "No Age"));
    let ages = dao
        .read_data(&query, |row| Ok(row.value_at(0).cloned()))
        .await
        .unwrap();
    assert_eq!(ages, vec![Some(Value::Null)]);
}

#[tokio::test]
async fn test_strict_missing_fields_rejects_insert() {
    let config = DaoConfig::default().with_missing_fields(MissingFieldPolicy::Fail);
    let (_dir, dao) = seeded_dao(config).await;

    let err = dao
        .insert_data("Person", &record! { "name" => "No Age" })
        .await
        .unwrap_err();

    assert!(matches!(err, GenDaoError::UnmappedColumn { .. }));
    assert_eq!(dao.get_count("Person", &[]).await.unwrap(), 5);
}

#[tokio::test]
async fn test_insert_into_missing_table() {
    let (_dir, dao) = temp_dao(DaoConfig::default());

    let err = dao
        .insert_data("Nobody", &record! { "name" => "x" })
        .await
        .unwrap_err();
    assert!(matches!(err, GenDaoError::SchemaLookup { .. }));
}

#[tokio::test]
async fn test_read_with_conditions_and_descending_order() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let query = ReadQuery::new("Person")
        .with_condition(WhereCondition::between("age", 30, 35))
        .with_order_by(OrderBy::descending(["age"]));
    let names: Vec<String> = dao.read_data(&query, |row| row.get("name")).await.unwrap();

    assert_eq!(names, ["Lily Aldrin", "Robin Scherbatsky", "Ted Mosby"]);
}

#[tokio::test]
async fn test_read_in_list() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let query = ReadQuery::new("Person")
        .with_condition(WhereCondition::in_list("id", [1, 3, 5]))
        .with_order_by(OrderBy::ascending(["id"]));
    let ids: Vec<i64> = dao.read_data(&query, |row| row.get("id")).await.unwrap();

    assert_eq!(ids, [1, 3, 5]);
}

#[tokio::test]
async fn test_read_row_json() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let query = ReadQuery::new("Person").with_condition(WhereCondition::equal("id", 1));
    let rows = dao.read_data(&query, |row| Ok(row.to_json())).await.unwrap();

    assert_eq!(
        rows,
        vec![serde_json::json!({ "id": 1, "name": "Ted Mosby", "age": 31 })]
    );
}

#[tokio::test]
async fn test_read_invalid_column_fails_before_executing() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let query = ReadQuery::new("Person").with_columns(["name; DROP TABLE Person"]);
    let err = dao.read_data(&query, person).await.unwrap_err();

    assert!(matches!(err, GenDaoError::InvalidIdentifier { .. }));
    assert_eq!(dao.get_count("Person", &[]).await.unwrap(), 5);
}

// =============================================================================
// Update Tests
// =============================================================================

#[tokio::test]
async fn test_update_by_primary_key() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;
    let mut people = read_people(&dao).await;

    people[1].name = "Marshall Eriksen UPDATE".to_string();
    people[1].age = 40;
    let affected = dao.update_data("Person", &people[1], &[]).await.unwrap();

    assert_eq!(affected, 1);
    let after = read_people(&dao).await;
    assert_eq!(after[1], people[1]);
    assert_eq!(after[0].name, "Ted Mosby");
}

#[tokio::test]
async fn test_update_with_explicit_conditions() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let affected = dao
        .update_data(
            "Person",
            &record! { "name" => "Someone Older", "age" => 50 },
            &[WhereCondition::greater_than("age", 33)],
        )
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let older = dao
        .get_count("Person", &[WhereCondition::equal("age", 50)])
        .await
        .unwrap();
    assert_eq!(older, 2);
}

#[tokio::test]
async fn test_update_without_key_or_conditions_fails() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let err = dao
        .update_data("Person", &record! { "name" => "x", "age" => 1 }, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, GenDaoError::MissingPrimaryKey { .. }));
}

#[tokio::test]
async fn test_per_column_update_skips_unchanged_columns() {
    let config = DaoConfig::default().with_update_strategy(UpdateStrategy::PerColumnTransactional);
    let (_dir, dao) = seeded_dao(config).await;
    let mut people = read_people(&dao).await;

    // Only age differs
    people[0].age = 32;
    let affected = dao.update_data("Person", &people[0], &[]).await.unwrap();

    assert_eq!(affected, 1);
    assert_eq!(read_people(&dao).await[0].age, 32);
}

#[tokio::test]
async fn test_per_column_update_sets_null() {
    let config = DaoConfig::default().with_update_strategy(UpdateStrategy::PerColumnTransactional);
    let (_dir, dao) = seeded_dao(config).await;

    let affected = dao
        .update_data(
            "Person",
            &record! { "id" => 2, "name" => "Marshall Eriksen", "age" => Value::Null },
            &[],
        )
        .await
        .unwrap();

    assert_eq!(affected, 1);
    let unknown_age = dao
        .read_data(
            &ReadQuery::new("Person").with_condition(WhereCondition::equal("id", 2)),
            |row| Ok(row.value("age").cloned()),
        )
        .await
        .unwrap();
    assert_eq!(unknown_age, vec![Some(Value::Null)]);
}

#[tokio::test]
async fn test_per_column_update_rolls_back_on_failure() {
    let config = DaoConfig::default().with_update_strategy(UpdateStrategy::PerColumnTransactional);
    let (_dir, dao) = temp_dao(config);
    dao.create_table(
        "Account",
        "id INTEGER PRIMARY KEY, owner TEXT, balance INTEGER CHECK (balance >= 0)",
        true,
    )
    .await
    .unwrap();
    dao.insert_data(
        "Account",
        &record! { "id" => 1, "owner" => "Ted", "balance" => 10 },
    )
    .await
    .unwrap();

    // owner updates first, then balance violates the CHECK constraint
    let err = dao
        .update_data(
            "Account",
            &record! { "id" => 1, "owner" => "Barney", "balance" => -5 },
            &[],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GenDaoError::Execution { .. }));

    let owners: Vec<String> = dao
        .read_data(&ReadQuery::new("Account"), |row| row.get("owner"))
        .await
        .unwrap();
    assert_eq!(owners, ["Ted"]);
}

// =============================================================================
// Count / Delete Tests
// =============================================================================

#[tokio::test]
async fn test_count_with_like() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let count = dao
        .get_count("Person", &[WhereCondition::like("name", "%Robin%")])
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_count_with_parsed_operator() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let operator: WhereOperator = ">=".parse().unwrap();
    let count = dao
        .get_count("Person", &[WhereCondition::new("age", Value::from(33), operator)])
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_unknown_operator_text_is_rejected() {
    let err = "=~".parse::<WhereOperator>().unwrap_err();
    assert!(matches!(err, GenDaoError::UnsupportedOperator { .. }));
}

#[tokio::test]
async fn test_delete_with_like() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    // Marshall Eriksen and Barney Stinson
    let deleted = dao
        .delete_data("Person", &[WhereCondition::like("name", "%ar%")])
        .await
        .unwrap();

    assert_eq!(deleted, 2);
    let names: Vec<String> = read_people(&dao)
        .await
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Ted Mosby", "Lily Aldrin", "Robin Scherbatsky"]);
}

#[tokio::test]
async fn test_delete_matching_nothing_returns_zero() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let deleted = dao
        .delete_data("Person", &[WhereCondition::equal("name", "Nobody")])
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_delete_requires_conditions() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let err = dao.delete_data("Person", &[]).await.unwrap_err();

    assert!(matches!(err, GenDaoError::MissingConditions { .. }));
    assert_eq!(dao.get_count("Person", &[]).await.unwrap(), 5);
}

#[tokio::test]
async fn test_empty_in_list_is_rejected() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let err = dao
        .delete_data("Person", &[WhereCondition::in_list("id", Vec::<i64>::new())])
        .await
        .unwrap_err();
    assert!(matches!(err, GenDaoError::InvalidCondition { .. }));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dao_clones_share_nothing_mutable() {
    let (_dir, dao) = seeded_dao(DaoConfig::default()).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dao = dao.clone();
            tokio::spawn(async move { dao.get_count("Person", &[]).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 5);
    }
}
