//! sqlchain CLI
//!
//! Renders SELECT and INSERT statements from the command line and, when a
//! database is configured, runs them.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Column, Row};
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::FmtSubscriber;

use sqlchain::condition::between;
use sqlchain::{connect, Insert, Order, Select, SqlValue};

/// Build and run parameterized SQL statements.
#[derive(Parser)]
#[command(name = "sqlchain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL. Statements are only rendered when absent.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a SELECT statement.
    Select(SelectArgs),

    /// Build an INSERT statement.
    Insert {
        /// Table to insert into.
        table: String,

        /// Column and value, e.g. `--col title "Hello"` (repeatable).
        #[arg(long = "col", num_args = 2, value_names = ["COLUMN", "VALUE"], required = true)]
        cols: Vec<String>,

        /// Run the statement against the database.
        #[arg(long)]
        execute: bool,
    },
}

/// Arguments of the `select` command.
#[derive(Args)]
struct SelectArgs {
    /// Table to select from.
    table: String,

    /// Projected column (repeatable; all columns if omitted).
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// Condition as a raw column expression and a value, e.g. `--filter "age >=" 18`.
    #[arg(short, long, num_args = 2, value_names = ["EXPR", "VALUE"])]
    filter: Vec<String>,

    /// Range condition, e.g. `--between score 10 20`.
    #[arg(long, num_args = 3, value_names = ["COLUMN", "LOW", "HIGH"])]
    between: Vec<String>,

    /// Order ascending by column (repeatable).
    #[arg(long)]
    asc: Vec<String>,

    /// Order descending by column (repeatable).
    #[arg(long)]
    desc: Vec<String>,

    /// Maximum number of rows.
    #[arg(short, long, default_value_t = 0)]
    limit: u64,

    /// Number of rows to skip.
    #[arg(short, long, default_value_t = 0)]
    offset: u64,

    /// Count matching rows instead of fetching them.
    #[arg(long)]
    count: bool,
}

impl SelectArgs {
    fn to_query(&self) -> Select {
        let mut query = Select::new(self.table.as_str()).project(self.columns.iter().cloned());
        for pair in self.filter.chunks_exact(2) {
            query = query.filter(pair[0].as_str(), parse_value(&pair[1]));
        }
        for range in self.between.chunks_exact(3) {
            query = query.condition(between(
                range[0].as_str(),
                parse_value(&range[1]),
                parse_value(&range[2]),
            ));
        }

        let orders: Vec<Order> = self
            .asc
            .iter()
            .map(|c| Order::asc(c.as_str()))
            .chain(self.desc.iter().map(|c| Order::desc(c.as_str())))
            .collect();
        if !orders.is_empty() {
            query = query.order(orders);
        }

        query.limit(self.limit).offset(self.offset)
    }
}

/// Parses a command-line literal: NULL, boolean, integer, float, then text.
fn parse_value(raw: &str) -> SqlValue {
    if raw.eq_ignore_ascii_case("null") {
        SqlValue::Null
    } else if let Ok(b) = raw.parse::<bool>() {
        SqlValue::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        SqlValue::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        SqlValue::Float(f)
    } else {
        SqlValue::Text(raw.to_string())
    }
}

fn print_statement(sql: &str, values: &[SqlValue]) {
    println!("{sql}");
    if !values.is_empty() {
        let rendered: Vec<String> = values.iter().map(SqlValue::to_sql_inline).collect();
        println!("-- values: [{}]", rendered.join(", "));
    }
}

/// A result row rendered as `column=value` pairs, for any table shape.
struct DisplayRow(Vec<String>);

impl sqlx::FromRow<'_, AnyRow> for DisplayRow {
    fn from_row(row: &AnyRow) -> sqlx::Result<Self> {
        let fields = row
            .columns()
            .iter()
            .map(|col| format!("{}={}", col.name(), display_cell(row, col.ordinal())))
            .collect();
        Ok(Self(fields))
    }
}

/// Decodes a cell by trying each supported type in turn.
fn display_cell(row: &AnyRow, i: usize) -> String {
    let value = row
        .try_get::<Option<String>, _>(i)
        .ok()
        .flatten()
        .map(SqlValue::Text)
        .or_else(|| row.try_get::<Option<i64>, _>(i).ok().flatten().map(SqlValue::Int))
        .or_else(|| row.try_get::<Option<f64>, _>(i).ok().flatten().map(SqlValue::Float))
        .or_else(|| row.try_get::<Option<bool>, _>(i).ok().flatten().map(SqlValue::Bool))
        .or_else(|| row.try_get::<Option<Vec<u8>>, _>(i).ok().flatten().map(SqlValue::Blob));

    match value {
        Some(SqlValue::Text(text)) => text,
        Some(other) => other.to_sql_inline(),
        None => String::from("NULL"),
    }
}

/// Builds the log subscriber. The CLI writes logs to stderr so stdout
/// carries only statements and rows.
fn log_subscriber<W>(verbose: bool, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let log_level = if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(writer)
        .finish()
}

fn warn_if_unordered(args: &SelectArgs, query: &Select) {
    if (args.limit > 0 || args.offset > 0) && !query.is_ordered() {
        warn!("Paginating without ORDER BY; row order is unspecified.");
    }
}

async fn open_pool(cli: &Cli) -> anyhow::Result<Option<AnyPool>> {
    match &cli.database {
        Some(url) => {
            let pool = connect(url, cli.max_connections)
                .await
                .with_context(|| format!("failed to connect to {url}"))?;
            Ok(Some(pool))
        }
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing::subscriber::set_global_default(log_subscriber(cli.verbose, std::io::stderr))?;

    let pool = open_pool(&cli).await?;

    match cli.command {
        Commands::Select(args) => {
            let query = args.to_query();
            warn_if_unordered(&args, &query);

            let (sql, values) = query.compile()?;
            print_statement(&sql, &values);

            let Some(pool) = pool else {
                return Ok(());
            };
            if args.count {
                println!("{}", query.count(&pool).await?);
            } else {
                let rows: Vec<DisplayRow> = query.fetch_all(&pool).await?;
                for row in &rows {
                    println!("{}", row.0.join("\t"));
                }
                info!("{} row(s)", rows.len());
            }
        }

        Commands::Insert {
            table,
            cols,
            execute,
        } => {
            let query = cols
                .chunks_exact(2)
                .fold(Insert::new(table), |q, pair| {
                    q.col(pair[0].as_str(), parse_value(&pair[1]))
                });

            let (sql, values) = query.compile()?;
            print_statement(&sql, &values);

            if execute {
                let Some(pool) = pool else {
                    bail!("--execute requires --database or DATABASE_URL");
                };
                let result = query.exec(&pool).await?;
                info!(
                    rows_affected = result.rows_affected(),
                    last_insert_id = ?result.last_insert_id(),
                    "Insert executed"
                );
            }
        }
    }

    Ok(())
}
