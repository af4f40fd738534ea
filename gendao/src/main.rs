//! Command-line harness for the gendao data access layer.
//!
//! Every subcommand builds one `DataAccessObject` from the global flags and
//! performs a single operation. Rows and column metadata are printed to
//! stdout as JSON lines; logs go to stderr.
//!
//! # Security Guarantees
//! - Connection strings appear in logs only in redacted form
//! - Values from the command line are always bound as parameters

mod args;
mod demo;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gendao_core::{
    DaoConfig, DataAccessObject, MissingFieldPolicy, OrderBy, ReadQuery, SortDirection,
    UpdateStrategy, WhereCondition, error::redact_database_url, logging::init_logging,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "gendao")]
#[command(about = "Provider-agnostic CRUD harness")]
#[command(version)]
#[command(long_about = "
gendao - CRUD against relational databases without hand-written SQL

Columns are discovered from the live table, so commands only name the
table, a JSON record and optional conditions.

CONDITIONS:
  Given as \"<column> <operator> <value>\", for example:
    --where \"age > 30\"
    --where \"name LIKE %Ted%\"
    --where \"age BETWEEN 30 AND 35\"
    --where \"id IN 1,3,5\"

SUPPORTED DATABASES:
- SQLite (file path, sqlite://, Data Source=...)
- PostgreSQL (postgres://) [default build]
- MySQL (mysql://) [if compiled with --features mysql]
- SQL Server (sqlserver://, ADO strings) [if compiled with --features mssql]

EXAMPLES:
  gendao --database-url people.db demo
  gendao --database-url people.db read Person --where \"age > 30\" --order-by id
  gendao --database-url postgres://localhost/app insert person '{\"name\":\"Ted\",\"age\":31}'
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all logging except errors")]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, help = "Write log events as JSON objects")]
    pub log_json: bool,
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// Database connection string
    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Database connection string (credentials will be sanitized in logs)"
    )]
    pub database_url: Option<String>,

    /// Database type selector
    #[arg(
        long,
        env = "GENDAO_DATABASE_TYPE",
        help = "sqlite, postgres, mysql or sql (inferred from the URL when omitted)"
    )]
    pub database_type: Option<String>,

    /// Update strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::Single)]
    pub update_strategy: StrategyArg,

    /// Fail when a record lacks a column instead of binding NULL
    #[arg(long)]
    pub strict_fields: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// One UPDATE over all columns
    Single,
    /// One guarded UPDATE per column inside a transaction
    PerColumn,
}

impl From<StrategyArg> for UpdateStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Single => UpdateStrategy::SingleStatement,
            StrategyArg::PerColumn => UpdateStrategy::PerColumnTransactional,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a table from column definitions
    CreateTable {
        table: String,
        /// Column definitions, e.g. "id INTEGER PRIMARY KEY, name TEXT"
        columns: String,
        /// Leave an existing table untouched
        #[arg(long)]
        if_not_exists: bool,
    },
    /// Print column metadata for a table
    Describe { table: String },
    /// Insert a JSON object as one row
    Insert { table: String, record: String },
    /// Print matching rows as JSON lines
    Read {
        table: String,
        /// Columns to select (all when omitted)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Columns to order by
        #[arg(long, value_delimiter = ',')]
        order_by: Vec<String>,
        /// Sort direction for --order-by
        #[arg(long, default_value = "asc")]
        direction: String,
    },
    /// Update rows from a JSON object (matched by primary key without --where)
    Update {
        table: String,
        record: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Delete matching rows
    Delete {
        table: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Count matching rows
    Count {
        table: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Run the Person create/insert/read/update/count/delete workflow
    Demo,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Condition "<column> <op> <value>"; repeat to AND several
    #[arg(short = 'w', long = "where")]
    pub conditions: Vec<String>,
}

impl FilterArgs {
    fn parse(&self) -> Result<Vec<WhereCondition>> {
        self.conditions
            .iter()
            .map(|text| {
                args::parse_condition(text).with_context(|| format!("Invalid condition '{}'", text))
            })
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_json)?;

    let dao = build_dao(&cli.connection, cli.global.verbose >= 2)?;
    run(&dao, cli.command).await
}

/// Builds the DAO described by the connection flags.
///
/// Driver statement logging is only enabled at trace verbosity.
fn build_dao(connection: &ConnectionArgs, log_statements: bool) -> Result<DataAccessObject> {
    let Some(database_url) = connection.database_url.as_deref() else {
        bail!("Database URL is required (--database-url or DATABASE_URL)");
    };
    let database_type =
        args::resolve_database_type(connection.database_type.as_deref(), database_url)?;

    let missing_fields = if connection.strict_fields {
        MissingFieldPolicy::Fail
    } else {
        MissingFieldPolicy::BindNull
    };
    let config = DaoConfig::default()
        .with_update_strategy(connection.update_strategy.into())
        .with_missing_fields(missing_fields)
        .with_log_statements(log_statements);

    info!(
        "Target: {} ({})",
        redact_database_url(database_url),
        database_type
    );
    Ok(DataAccessObject::with_config(
        database_url,
        database_type,
        config,
    )?)
}

async fn run(dao: &DataAccessObject, command: Command) -> Result<()> {
    match command {
        Command::CreateTable {
            table,
            columns,
            if_not_exists,
        } => {
            dao.create_table(&table, &columns, if_not_exists).await?;
            println!("Table {} ready", table);
        }
        Command::Describe { table } => {
            for column in dao.get_columns(&table).await? {
                println!("{}", serde_json::to_string(&column)?);
            }
        }
        Command::Insert { table, record } => {
            let record = args::parse_record(&record)?;
            let inserted = dao.insert_data(&table, &record).await?;
            println!("Inserted: {}", inserted);
        }
        Command::Read {
            table,
            columns,
            filter,
            order_by,
            direction,
        } => {
            let mut query = ReadQuery::new(table)
                .with_columns(columns)
                .with_conditions(filter.parse()?);
            if !order_by.is_empty() {
                let direction: SortDirection = direction.parse()?;
                query = query.with_order_by(match direction {
                    SortDirection::Ascending => OrderBy::ascending(order_by),
                    SortDirection::Descending => OrderBy::descending(order_by),
                });
            }
            let rows = dao.read_data(&query, |row| Ok(row.to_json())).await?;
            for row in &rows {
                println!("{}", row);
            }
            debug!("Printed {} rows", rows.len());
        }
        Command::Update {
            table,
            record,
            filter,
        } => {
            let record = args::parse_record(&record)?;
            let affected = dao.update_data(&table, &record, &filter.parse()?).await?;
            println!("Updated: {}", affected);
        }
        Command::Delete { table, filter } => {
            let affected = dao.delete_data(&table, &filter.parse()?).await?;
            println!("Deleted: {}", affected);
        }
        Command::Count { table, filter } => {
            let count = dao.get_count(&table, &filter.parse()?).await?;
            println!("{}", count);
        }
        Command::Demo => {
            let report = demo::run(dao).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
