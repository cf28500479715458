//! # sqlfacade
//!
//! One query-building facade over MySQL, MS SQL Server and PostgreSQL.
//!
//! ## Features
//!
//! - **Accumulated state**: table, WHERE conditions, ORDER BY, LIMIT and
//!   GROUP BY persist across statements until cleared
//! - **Literal SQL**: values are escaped `addslashes`-style and quoted into the
//!   statement text; `literal` values go in verbatim
//! - **Safemode**: UPDATE and DELETE without WHERE conditions are refused
//!   before anything reaches the server
//! - **One result shape**: every backend's cursor is normalized into an
//!   [`ExecutionResult`] with row and affected counts
//! - **Monitoring**: statement events go to `tracing` and to a pluggable
//!   [`QueryMonitor`]
//!
//! ## Example
//!
//! ```ignore
//! use sqlfacade::{ConnectionConfig, DbType, Direction, Outcome, Query};
//!
//! let config = ConnectionConfig::new()
//!     .db_type(DbType::Mysqli)
//!     .database("shop");
//! let mut q = Query::connect(&config).await?;
//!
//! // SELECT * FROM users WHERE id = '1' ORDER BY id ASC, date DESC LIMIT 0,10
//! q.table("users")
//!     .and_where(("id", 1))
//!     .order("id")
//!     .order(("date", Direction::Desc))
//!     .limit((0, 10));
//! if let Outcome::Executed(result) = q.select(&[]).await? {
//!     for row in result.fetch.into_rows() {
//!         println!("{:?}", row.get("name"));
//!     }
//! }
//!
//! // Refused: no WHERE conditions after clearing them
//! q.clear("where");
//! assert!(q.delete().await?.is_guard_rejected());
//! ```

pub mod backend;
pub mod builder;
pub mod condition;
pub mod config;
pub mod error;
pub mod escape;
pub mod monitor;
pub mod normalize;
pub mod query;
pub mod result;

pub use backend::{AnyBackend, Backend, PgBackend};
#[cfg(feature = "mssql")]
pub use backend::MssqlBackend;
#[cfg(feature = "mysql")]
pub use backend::MySqlBackend;
pub use builder::{BuilderState, ClearScope, Direction, LimitSpec, OrderSpec, Rendered, fields};
pub use condition::{Condition, ConditionSet, ConditionSpec};
pub use config::{ConnectionConfig, DbType};
pub use error::{DbError, DbResult};
pub use escape::{Value, escape, escape_str};
pub use monitor::{
    NoopMonitor, QueryContext, QueryEvent, QueryMonitor, QueryStats, QueryType, StatsMonitor,
    TracingMonitor,
};
pub use normalize::{SuccessSignal, evaluate_success};
pub use query::{ExecOptions, Query, WriteOptions};
pub use result::{ExecutionResult, Fetch, Outcome, ResultHandle, Row};
