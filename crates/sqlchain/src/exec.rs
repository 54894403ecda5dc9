//! Database plumbing shared by the builders.
//!
//! Statements run through sqlx's `Any` driver so the same builder output can
//! target MySQL in production and an in-memory SQLite database in tests.

use sqlx::any::{AnyArguments, AnyPoolOptions};
use sqlx::query::Query;
use sqlx::{Any, AnyPool};
use tracing::debug;

use crate::error::Result;
use crate::value::SqlValue;

/// Opens a pool for `url`, registering the compiled-in drivers first.
pub async fn connect(url: &str, max_connections: u32) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();
    debug!(max_connections, "Opening database pool");
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Binds `values` to the placeholders of `query`, left to right.
pub(crate) fn bind_all<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    values: Vec<SqlValue>,
) -> Query<'q, Any, AnyArguments<'q>> {
    values.into_iter().fold(query, bind_value)
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}
