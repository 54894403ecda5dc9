//! SELECT statement builder.
//!
//! [`Select`] is an immutable value: every configuration method borrows the
//! receiver and returns a new builder, so one base query can be shared and
//! refined in several directions without the branches seeing each other.
//!
//! # Example
//!
//! ```rust
//! use sqlchain::condition::between;
//! use sqlchain::Select;
//!
//! let base = Select::new("users").filter("active =", true);
//! let page = base
//!     .condition(between("age", 18, 65))
//!     .sort_desc("created_at")
//!     .limit(10)
//!     .offset(20);
//!
//! let (sql, values) = page.compile().unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM users WHERE active = ? AND age BETWEEN ? AND ? \
//!      ORDER BY created_at DESC LIMIT 20, 10"
//! );
//! assert_eq!(values.len(), 3);
//!
//! // The base query is untouched.
//! assert_eq!(base.compile().unwrap().0, "SELECT * FROM users WHERE active = ?");
//! ```

use std::sync::Arc;

use sqlx::any::AnyRow;
use sqlx::{AnyPool, FromRow, Row};
use tracing::debug;

use crate::condition::{Condition, Filter};
use crate::error::{Error, Result};
use crate::exec::bind_all;
use crate::order::{Order, OrderDirection};
use crate::value::{SqlValue, ToSqlValue};

/// Row count used for an offset without a limit.
///
/// `LIMIT` takes both arguments in this dialect, so "no upper bound" is
/// spelled as the largest unsigned 64-bit value.
pub const UNBOUNDED_LIMIT: u64 = u64::MAX;

/// A SELECT statement over a single table.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    /// Combined with AND
    conditions: Vec<Arc<dyn Condition>>,
    orders: Vec<Order>,
    /// Zero means no limit
    limit: u64,
    offset: u64,
}

impl Select {
    /// Creates a `SELECT * FROM <table>` builder.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            orders: Vec::new(),
            limit: 0,
            offset: 0,
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Replaces the projected columns. An empty list selects `*`.
    #[must_use]
    pub fn project<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.columns = columns.into_iter().map(Into::into).collect();
        next
    }

    /// Adds a `<column> ?` condition. Same as `condition(Filter::new(..))`.
    #[must_use]
    pub fn filter(&self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.condition(Filter::new(column, value))
    }

    /// Appends a condition. All conditions are joined with AND.
    #[must_use]
    pub fn condition(&self, cond: impl Condition + 'static) -> Self {
        let mut next = self.clone();
        next.conditions.push(cond.shared());
        next
    }

    /// Orders by a single column, ascending. Replaces any previous ordering.
    #[must_use]
    pub fn sort_asc(&self, column: impl Into<String>) -> Self {
        self.order([Order::new(column, OrderDirection::Asc)])
    }

    /// Orders by a single column, descending. Replaces any previous ordering.
    #[must_use]
    pub fn sort_desc(&self, column: impl Into<String>) -> Self {
        self.order([Order::new(column, OrderDirection::Desc)])
    }

    /// Replaces the ordering with `orders`, in the given sequence.
    ///
    /// Unlike [`Select::condition`], this does not accumulate.
    #[must_use]
    pub fn order(&self, orders: impl IntoIterator<Item = Order>) -> Self {
        let mut next = self.clone();
        next.orders = orders.into_iter().collect();
        next
    }

    /// Sets the maximum number of rows. Zero removes the limit.
    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        let mut next = self.clone();
        next.limit = limit;
        next
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub fn offset(&self, offset: u64) -> Self {
        let mut next = self.clone();
        next.offset = offset;
        next
    }

    /// Returns whether an ordering has been set.
    ///
    /// Paginating an unordered query gives an unspecified row order, so
    /// callers check this before applying a default sort.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        !self.orders.is_empty()
    }

    /// Renders the statement and the values for its placeholders.
    ///
    /// Clauses are emitted in a fixed order: projection, FROM, WHERE,
    /// ORDER BY, LIMIT. A failing condition aborts the whole statement.
    pub fn compile(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = String::from("SELECT ");
        let mut values = Vec::new();

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        if !self.conditions.is_empty() {
            let mut parts = Vec::with_capacity(self.conditions.len());
            for cond in &self.conditions {
                let (fragment, cond_values) = cond.to_sql()?;
                if fragment.is_empty() {
                    return Err(Error::EmptyCondition);
                }
                parts.push(fragment);
                values.extend(cond_values);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        if !self.orders.is_empty() {
            let parts: Vec<String> = self.orders.iter().map(Order::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if self.limit > 0 {
            sql.push_str(&format!(" LIMIT {}, {}", self.offset, self.limit));
        } else if self.offset > 0 {
            sql.push_str(&format!(" LIMIT {}, {UNBOUNDED_LIMIT}", self.offset));
        }

        Ok((sql, values))
    }
}

/// Async execution methods for Select.
impl Select {
    /// Runs the query and appends one record per row to `out`, in row order.
    ///
    /// If a row fails to map, the rows before it stay in `out` and the error
    /// is returned; the partial contents should not be relied on.
    pub async fn fetch_into<T>(&self, pool: &AnyPool, out: &mut Vec<T>) -> Result<()>
    where
        T: for<'r> FromRow<'r, AnyRow>,
    {
        let (sql, values) = self.compile()?;
        debug!(sql = %sql, params = values.len(), "Fetching rows");

        let rows = bind_all(sqlx::query(&sql), values)
            .fetch_all(pool)
            .await
            .map_err(|e| Error::query(&sql, e))?;

        out.reserve(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let record = T::from_row(row).map_err(|source| Error::Materialize { index, source })?;
            out.push(record);
        }
        Ok(())
    }

    /// Runs the query and returns every row as a record.
    pub async fn fetch_all<T>(&self, pool: &AnyPool) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, AnyRow>,
    {
        let mut records = Vec::new();
        self.fetch_into(pool, &mut records).await?;
        Ok(records)
    }

    /// Returns the first row, or None if no rows match.
    pub async fn fetch_optional<T>(&self, pool: &AnyPool) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, AnyRow>,
    {
        let (sql, values) = self.limit(1).compile()?;
        debug!(sql = %sql, params = values.len(), "Fetching first row");

        let row = bind_all(sqlx::query(&sql), values)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::query(&sql, e))?;

        row.map(|row| T::from_row(&row).map_err(|source| Error::Materialize { index: 0, source }))
            .transpose()
    }

    /// Returns the number of matching rows.
    ///
    /// The projection of a clone is replaced with `COUNT(*)`; `self` keeps
    /// its columns.
    pub async fn count(&self, pool: &AnyPool) -> Result<i64> {
        let (sql, values) = self.project(["COUNT(*)"]).compile()?;
        debug!(sql = %sql, params = values.len(), "Counting rows");

        let row = bind_all(sqlx::query(&sql), values)
            .fetch_one(pool)
            .await
            .map_err(|e| Error::query(&sql, e))?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Returns whether any row matches.
    pub async fn exists(&self, pool: &AnyPool) -> Result<bool> {
        Ok(self.count(pool).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{between, filter, in_list, not, LogicOr};

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    #[test]
    fn test_simple_select() {
        let (sql, values) = Select::new("foo_table").compile().unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table");
        assert!(values.is_empty());
    }

    #[test]
    fn test_project_columns() {
        let (sql, _) = Select::new("foo_table")
            .project(["foo", "bar"])
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT foo, bar FROM foo_table");
    }

    #[test]
    fn test_project_replaces_and_empty_means_star() {
        let q = Select::new("t").project(["a"]).project(["b", "c"]);
        assert_eq!(q.compile().unwrap().0, "SELECT b, c FROM t");

        let q = q.project(std::iter::empty::<&str>());
        assert_eq!(q.compile().unwrap().0, "SELECT * FROM t");
    }

    #[test]
    fn test_filter_column() {
        let (sql, values) = Select::new("foo_table")
            .filter("foo =", "bar")
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table WHERE foo = ?");
        assert_eq!(values, vec![text("bar")]);
    }

    #[test]
    fn test_filter_multiple_columns() {
        let (sql, values) = Select::new("foo_table")
            .filter("foo =", "bar")
            .filter("baz =", "qux")
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table WHERE foo = ? AND baz = ?");
        assert_eq!(values, vec![text("bar"), text("qux")]);
    }

    #[test]
    fn test_between_condition() {
        let (sql, values) = Select::new("foo_table")
            .condition(between("foo", "bar", "baz"))
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table WHERE foo BETWEEN ? AND ?");
        assert_eq!(values, vec![text("bar"), text("baz")]);
    }

    #[test]
    fn test_logic_or_condition() {
        let (sql, values) = Select::new("foo_table")
            .condition(
                LogicOr::default()
                    .or(filter("foo =", "bar"))
                    .or(filter("baz =", 3)),
            )
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table WHERE (foo = ?) OR (baz = ?)");
        assert_eq!(values, vec![text("bar"), SqlValue::Int(3)]);
    }

    #[test]
    fn test_sort_asc() {
        let (sql, values) = Select::new("foo_table").sort_asc("foo").compile().unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table ORDER BY foo ASC");
        assert!(values.is_empty());
    }

    #[test]
    fn test_sort_desc() {
        let (sql, _) = Select::new("foo_table").sort_desc("foo").compile().unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table ORDER BY foo DESC");
    }

    #[test]
    fn test_multiple_sorts() {
        let (sql, _) = Select::new("foo_table")
            .order([Order::desc("foo"), Order::asc("bar")])
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table ORDER BY foo DESC, bar ASC");
    }

    #[test]
    fn test_order_replaces_previous_orders() {
        let (sql, _) = Select::new("foo_table")
            .sort_asc("first")
            .sort_desc("second")
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table ORDER BY second DESC");

        let (sql, _) = Select::new("foo_table")
            .sort_asc("first")
            .order([Order::desc("foo"), Order::asc("bar")])
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table ORDER BY foo DESC, bar ASC");
    }

    #[test]
    fn test_limit() {
        let (sql, _) = Select::new("foo_table").limit(10).compile().unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table LIMIT 0, 10");
    }

    #[test]
    fn test_offset() {
        let (sql, _) = Select::new("foo_table").offset(40).compile().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM foo_table LIMIT 40, 18446744073709551615"
        );
    }

    #[test]
    fn test_offset_and_limit() {
        let (sql, _) = Select::new("foo_table")
            .limit(10)
            .offset(40)
            .compile()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM foo_table LIMIT 40, 10");
    }

    #[test]
    fn test_clause_order() {
        let (sql, values) = Select::new("t")
            .offset(5)
            .sort_asc("id")
            .limit(2)
            .project(["id", "name"])
            .filter("name LIKE", "a%")
            .compile()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT id, name FROM t WHERE name LIKE ? ORDER BY id ASC LIMIT 5, 2"
        );
        assert_eq!(values, vec![text("a%")]);
    }

    #[test]
    fn test_receiver_is_not_mutated() {
        let base = Select::new("t").filter("a =", 1);
        let before = base.compile().unwrap();

        let _ = base.filter("b =", 2).sort_asc("a").limit(3).offset(4).project(["a"]);

        assert_eq!(base.compile().unwrap(), before);
        assert!(!base.is_ordered());
    }

    #[test]
    fn test_sibling_builders_do_not_alias() {
        let base = Select::new("t").filter("a =", 1).filter("b =", 2);
        let left = base.filter("c =", 3);
        let right = base.filter("d =", 4);

        assert_eq!(
            left.compile().unwrap().0,
            "SELECT * FROM t WHERE a = ? AND b = ? AND c = ?"
        );
        assert_eq!(
            right.compile().unwrap().0,
            "SELECT * FROM t WHERE a = ? AND b = ? AND d = ?"
        );
        assert_eq!(right.compile().unwrap().1[2], SqlValue::Int(4));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let q = Select::new("t")
            .condition(LogicOr::default().or(filter("a =", 1)).or(filter("b =", 2)))
            .sort_desc("a")
            .limit(1);
        assert_eq!(q.compile().unwrap(), q.compile().unwrap());
    }

    #[test]
    fn test_is_ordered() {
        let q = Select::new("t").filter("a =", 1).limit(10);
        assert!(!q.is_ordered());
        assert!(q.sort_asc("a").is_ordered());
        assert!(q.sort_desc("a").is_ordered());
        assert!(q.order([Order::asc("a")]).is_ordered());
    }

    #[test]
    fn test_failing_condition_aborts_compile() {
        let q = Select::new("t")
            .filter("a =", 1)
            .condition(LogicOr::default().or(in_list("b", Vec::<i64>::new())));
        assert!(matches!(q.compile(), Err(Error::EmptyInList(_))));
    }

    #[test]
    fn test_empty_disjunction_is_rejected() {
        let q = Select::new("t").condition(LogicOr::default());
        assert!(matches!(q.compile(), Err(Error::EmptyCondition)));
    }

    #[test]
    fn test_nested_empty_group_is_rejected() {
        let q = Select::new("t").condition(
            LogicOr::default()
                .or(filter("a =", 1))
                .or(LogicOr::default()),
        );
        assert!(matches!(q.compile(), Err(Error::EmptyCondition)));

        let q = Select::new("t").condition(not(LogicOr::default()));
        assert!(matches!(q.compile(), Err(Error::EmptyCondition)));

        let q = Select::new("t").condition(LogicOr::default().or(LogicOr::default()));
        assert!(matches!(q.compile(), Err(Error::EmptyCondition)));
    }

    #[test]
    fn test_values_follow_declaration_order() {
        let (_, values) = Select::new("t")
            .condition(between("a", 1, 2))
            .filter("b =", "x")
            .condition(in_list("c", [7, 8]))
            .compile()
            .unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::Int(1),
                SqlValue::Int(2),
                text("x"),
                SqlValue::Int(7),
                SqlValue::Int(8),
            ]
        );
    }
}
