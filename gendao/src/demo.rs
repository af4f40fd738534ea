//! End-to-end Person workflow against any configured backend.

use gendao_core::{
    DataAccessObject, DatabaseType, OrderBy, ReadQuery, Result, Row, WhereCondition, impl_record,
};
use serde::Serialize;
use tracing::info;

pub const TABLE: &str = "Person";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

impl_record!(Person { id, name, age });

impl Person {
    fn new(name: &str, age: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            age,
        }
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
        })
    }
}

/// Column definitions for the Person table in each dialect.
pub fn person_columns(database_type: DatabaseType) -> &'static str {
    match database_type {
        DatabaseType::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER",
        DatabaseType::Postgres => "id SERIAL PRIMARY KEY, name TEXT, age INTEGER",
        DatabaseType::MySql => "id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(100), age INT",
        DatabaseType::SqlServer => "id INT IDENTITY(1,1) PRIMARY KEY, name NVARCHAR(100), age INT",
    }
}

fn sample_people() -> Vec<Person> {
    vec![
        Person::new("Terrence Cook", 31),
        Person::new("Eric Ware", 27),
        Person::new("Joy Wilks", 34),
        Person::new("Michael Bruce", 38),
        Person::new("Samantha Kane", 33),
    ]
}

/// What each step of the workflow observed.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub inserted: usize,
    pub people: Vec<Person>,
    pub updated: u64,
    pub samantha_count: i64,
    pub deleted: u64,
    pub remaining: i64,
}

async fn read_people(dao: &DataAccessObject) -> Result<Vec<Person>> {
    let query = ReadQuery::new(TABLE)
        .with_columns(["id", "name", "age"])
        .with_order_by(OrderBy::ascending(["id"]));
    dao.read_data(&query, Person::from_row).await
}

/// Runs create, insert, read, update, count and delete in sequence.
pub async fn run(dao: &DataAccessObject) -> Result<DemoReport> {
    dao.create_table(TABLE, person_columns(dao.database_type()), true)
        .await?;

    let mut inserted = 0;
    for person in sample_people() {
        if dao.insert_data(TABLE, &person).await? {
            inserted += 1;
        }
    }
    info!("Inserted {} people", inserted);

    let mut people = read_people(dao).await?;
    info!("Read {} people", people.len());

    let mut updated = 0;
    if let Some(person) = people.get_mut(1) {
        person.name.push_str(" UPDATE");
        person.age = 40;
        updated = dao.update_data(TABLE, &*person, &[]).await?;
    }

    let samantha_count = dao
        .get_count(TABLE, &[WhereCondition::like("name", "%Samantha%")])
        .await?;

    let deleted = dao
        .delete_data(TABLE, &[WhereCondition::like("name", "%W%")])
        .await?;
    let remaining = dao.get_count(TABLE, &[]).await?;

    Ok(DemoReport {
        inserted,
        people,
        updated,
        samantha_count,
        deleted,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_against_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.db");
        let dao = DataAccessObject::new(path.to_str().unwrap(), DatabaseType::Sqlite).unwrap();

        let report = run(&dao).await.unwrap();

        assert_eq!(report.inserted, 5);
        assert_eq!(report.people.len(), 5);
        assert_eq!(report.people[1].name, "Eric Ware UPDATE");
        assert_eq!(report.updated, 1);
        assert_eq!(report.samantha_count, 1);
        // "Eric Ware UPDATE" and "Joy Wilks"
        assert_eq!(report.deleted, 2);
        assert_eq!(report.remaining, 3);
    }

    #[tokio::test]
    async fn test_demo_reruns_on_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.db");
        let dao = DataAccessObject::new(path.to_str().unwrap(), DatabaseType::Sqlite).unwrap();

        run(&dao).await.unwrap();
        let second = run(&dao).await.unwrap();

        assert_eq!(second.inserted, 5);
        assert_eq!(second.people.len(), 8);
    }
}
