//! Composable WHERE predicates.
//!
//! A [`Condition`] renders to a SQL fragment and the values bound to its
//! placeholders. The number of `?` in the fragment always equals the number
//! of returned values, in left-to-right order.
//!
//! # Example
//!
//! ```rust
//! use sqlchain::condition::{filter, Condition, LogicOr};
//! use sqlchain::SqlValue;
//!
//! let cond = LogicOr::default()
//!     .or(filter("foo =", "bar"))
//!     .or(filter("baz =", 3));
//!
//! let (sql, values) = cond.to_sql().unwrap();
//! assert_eq!(sql, "(foo = ?) OR (baz = ?)");
//! assert_eq!(values, vec![SqlValue::from("bar"), SqlValue::Int(3)]);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{SqlValue, ToSqlValue};

/// A predicate fragment with its bound values.
///
/// Implementations must keep the placeholder count of the fragment equal to
/// the length of the value list.
pub trait Condition: fmt::Debug + Send + Sync {
    /// Renders the fragment and its values.
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)>;

    /// Moves the condition behind a shared pointer.
    fn shared(self) -> Arc<dyn Condition>
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

impl<C: Condition + ?Sized> Condition for Arc<C> {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        (**self).to_sql()
    }
}

/// `<column> ?` with a single value.
///
/// The column is raw SQL and usually carries its operator, e.g. `"age >="`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    column: String,
    value: SqlValue,
}

impl Filter {
    /// Creates a filter.
    pub fn new(column: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self {
            column: column.into(),
            value: value.to_sql_value(),
        }
    }
}

impl Condition for Filter {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        Ok((format!("{} ?", self.column), vec![self.value.clone()]))
    }
}

/// `<column> BETWEEN ? AND ?`.
#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    column: String,
    lower: SqlValue,
    upper: SqlValue,
}

impl Between {
    /// Creates an inclusive range check.
    pub fn new(column: impl Into<String>, lower: impl ToSqlValue, upper: impl ToSqlValue) -> Self {
        Self {
            column: column.into(),
            lower: lower.to_sql_value(),
            upper: upper.to_sql_value(),
        }
    }
}

impl Condition for Between {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        Ok((
            format!("{} BETWEEN ? AND ?", self.column),
            vec![self.lower.clone(), self.upper.clone()],
        ))
    }
}

/// `<column> IN (?, ?, ...)`. Rendering fails on an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct In {
    column: String,
    values: Vec<SqlValue>,
}

impl In {
    /// Creates a membership check.
    pub fn new<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        }
    }
}

impl Condition for In {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.values.is_empty() {
            return Err(Error::EmptyInList(self.column.clone()));
        }
        let placeholders = vec!["?"; self.values.len()].join(", ");
        Ok((
            format!("{} IN ({placeholders})", self.column),
            self.values.clone(),
        ))
    }
}

/// A fragment passed through verbatim.
///
/// The caller is responsible for matching placeholders to values.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    sql: String,
    values: Vec<SqlValue>,
}

impl Raw {
    /// Creates a raw fragment.
    pub fn new(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }
}

impl Condition for Raw {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        Ok((self.sql.clone(), self.values.clone()))
    }
}

/// `NOT (<inner>)`.
#[derive(Debug, Clone)]
pub struct Not {
    inner: Arc<dyn Condition>,
}

impl Not {
    /// Negates a condition.
    pub fn new(inner: impl Condition + 'static) -> Self {
        Self {
            inner: inner.shared(),
        }
    }
}

impl Condition for Not {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let (sql, values) = self.inner.to_sql()?;
        if sql.is_empty() {
            return Err(Error::EmptyCondition);
        }
        Ok((format!("NOT ({sql})"), values))
    }
}

/// Renders each child in parentheses and joins them with `separator`.
///
/// The first failing child aborts rendering; nothing from earlier children
/// is returned. A child with an empty fragment would render as `()`, so it
/// fails with [`Error::EmptyCondition`].
fn join_children(
    children: &[Arc<dyn Condition>],
    separator: &str,
) -> Result<(String, Vec<SqlValue>)> {
    let mut parts = Vec::with_capacity(children.len());
    let mut values = Vec::new();
    for child in children {
        let (sql, child_values) = child.to_sql()?;
        if sql.is_empty() {
            return Err(Error::EmptyCondition);
        }
        parts.push(format!("({sql})"));
        values.extend(child_values);
    }
    Ok((parts.join(separator), values))
}

/// Disjunction of child conditions.
///
/// Every child is parenthesized, even when there is only one. With no
/// children the fragment is empty; such a disjunction cannot be nested in
/// another group or negated.
#[derive(Debug, Clone, Default)]
pub struct LogicOr {
    children: Vec<Arc<dyn Condition>>,
}

impl LogicOr {
    /// Creates a disjunction from already shared conditions.
    pub fn new(children: impl IntoIterator<Item = Arc<dyn Condition>>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }

    /// Adds an alternative.
    #[must_use]
    pub fn or(mut self, cond: impl Condition + 'static) -> Self {
        self.children.push(cond.shared());
        self
    }

    /// Returns true if there are no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Condition for LogicOr {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        join_children(&self.children, " OR ")
    }
}

/// Conjunction of child conditions, parenthesized like [`LogicOr`].
///
/// Useful for nesting inside a [`LogicOr`]; top-level conditions of a SELECT
/// are already joined with AND.
#[derive(Debug, Clone, Default)]
pub struct LogicAnd {
    children: Vec<Arc<dyn Condition>>,
}

impl LogicAnd {
    /// Creates a conjunction from already shared conditions.
    pub fn new(children: impl IntoIterator<Item = Arc<dyn Condition>>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }

    /// Adds a required condition.
    #[must_use]
    pub fn and(mut self, cond: impl Condition + 'static) -> Self {
        self.children.push(cond.shared());
        self
    }

    /// Returns true if there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Condition for LogicAnd {
    fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        join_children(&self.children, " AND ")
    }
}

/// Shorthand for [`Filter::new`].
pub fn filter(column: impl Into<String>, value: impl ToSqlValue) -> Filter {
    Filter::new(column, value)
}

/// Shorthand for [`Between::new`].
pub fn between(column: impl Into<String>, lower: impl ToSqlValue, upper: impl ToSqlValue) -> Between {
    Between::new(column, lower, upper)
}

/// Shorthand for [`In::new`].
pub fn in_list<I, V>(column: impl Into<String>, values: I) -> In
where
    I: IntoIterator<Item = V>,
    V: ToSqlValue,
{
    In::new(column, values)
}

/// Shorthand for [`Not::new`].
pub fn not(inner: impl Condition + 'static) -> Not {
    Not::new(inner)
}
