//! # sqlchain
//!
//! Immutable, chainable builders for parameterized SELECT and INSERT
//! statements.
//!
//! This crate provides:
//! - [`Select`] with projection, AND-combined conditions, ordering and
//!   `LIMIT offset, count` pagination
//! - [`Insert`] for single-row inserts
//! - Composable [`Condition`]s: [`Filter`], [`Between`], [`LogicOr`] and more
//! - Async execution through sqlx, mapping rows with `FromRow`
//!
//! Column strings are raw SQL and are concatenated verbatim. Only values go
//! through `?` placeholders.
//!
//! ## Building Statements
//!
//! ```rust
//! use sqlchain::condition::{filter, LogicOr};
//! use sqlchain::{Insert, Select, SqlValue};
//!
//! let (sql, values) = Select::new("users")
//!     .project(["id", "email"])
//!     .condition(LogicOr::default().or(filter("role =", "admin")).or(filter("role =", "owner")))
//!     .sort_asc("id")
//!     .limit(50)
//!     .compile()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT id, email FROM users WHERE (role = ?) OR (role = ?) ORDER BY id ASC LIMIT 0, 50"
//! );
//! assert_eq!(values, vec![SqlValue::from("admin"), SqlValue::from("owner")]);
//!
//! let (sql, _) = Insert::new("users").col("email", "a@example.com").compile().unwrap();
//! assert_eq!(sql, "INSERT INTO users(email) VALUES (?)");
//! ```
//!
//! ## Running Statements
//!
//! ```ignore
//! #[derive(sqlx::FromRow)]
//! struct User {
//!     id: i64,
//!     email: String,
//! }
//!
//! let pool = sqlchain::connect("mysql://localhost/app", 5).await?;
//! let query = Select::new("users").filter("active =", true);
//! let users: Vec<User> = query.fetch_all(&pool).await?;
//! let total = query.count(&pool).await?;
//! ```

pub mod condition;
mod error;
mod exec;
mod insert;
pub mod order;
mod select;
pub mod value;

pub use condition::{Between, Condition, Filter, In, LogicAnd, LogicOr, Not, Raw};
pub use error::{Error, Result};
pub use exec::connect;
pub use insert::Insert;
pub use order::{Order, OrderDirection};
pub use select::{Select, UNBOUNDED_LIMIT};
pub use value::{SqlValue, ToSqlValue};
