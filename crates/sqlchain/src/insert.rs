//! INSERT statement builder.

use sqlx::any::AnyQueryResult;
use sqlx::AnyPool;
use tracing::debug;

use crate::error::{Error, Result};
use crate::exec::bind_all;
use crate::value::{SqlValue, ToSqlValue};

/// A single-row INSERT.
///
/// Columns and values are only ever added together, so both lists always
/// have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Insert {
    /// Creates an INSERT into `table` with no columns yet.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Adds a column and its value, returning a new builder.
    #[must_use]
    pub fn col(&self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        let mut next = self.clone();
        next.columns.push(column.into());
        next.values.push(value.to_sql_value());
        next
    }

    /// Renders `INSERT INTO <table>(<cols>) VALUES (?, ...)` and its values.
    ///
    /// Fails with [`Error::NoColumns`] when no column has been added.
    pub fn compile(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.columns.is_empty() {
            return Err(Error::NoColumns(self.table.clone()));
        }

        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES ({placeholders})",
            self.table,
            self.columns.join(", ")
        );
        Ok((sql, self.values.clone()))
    }

    /// Runs the INSERT and returns the driver's result descriptor.
    pub async fn exec(&self, pool: &AnyPool) -> Result<AnyQueryResult> {
        let (sql, values) = self.compile()?;
        debug!(sql = %sql, params = values.len(), "Executing insert");

        bind_all(sqlx::query(&sql), values)
            .execute(pool)
            .await
            .map_err(|e| Error::query(&sql, e))
    }
}
