use super::{starts_with_keyword, strip_sql_prefix};
use crate::config::DbType;
use std::fmt;
use std::time::Duration;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

impl QueryType {
    /// Detect query type from SQL string.
    ///
    /// For CTEs (`WITH ...`), looks past the CTE definitions to find the
    /// actual DML keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else if starts_with_keyword(trimmed, "WITH") {
            Self::detect_cte_dml(trimmed)
        } else {
            QueryType::Other
        }
    }

    /// Whether statements of this type hand back a result set.
    pub fn returns_rows(&self) -> bool {
        matches!(self, QueryType::Select)
    }

    fn detect_cte_dml(sql: &str) -> Self {
        // The final statement follows the last top-level closing paren.
        let mut depth: i32 = 0;
        let mut last_top_level = 0;
        let bytes = sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        last_top_level = i + 1;
                    }
                }
                b'\'' => {
                    i += 1;
                    while i < bytes.len() {
                        if bytes[i] == b'\\' {
                            i += 1;
                        } else if bytes[i] == b'\'' {
                            if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                                i += 1;
                            } else {
                                break;
                            }
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let remainder = sql.get(last_top_level..).unwrap_or("").trim_start();
        if starts_with_keyword(remainder, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(remainder, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(remainder, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Select
        }
    }
}

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL text sent to the backend.
    pub sql: String,
    /// Detected query type.
    pub query_type: QueryType,
    /// Backend the statement runs on.
    pub db_type: DbType,
}

impl QueryContext {
    pub fn new(sql: &str, db_type: DbType) -> Self {
        Self {
            sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            db_type,
        }
    }
}

/// Maximum length for error messages in `QueryEvent::Error`.
const MAX_ERROR_LEN: usize = 512;

/// How a statement finished, for monitoring purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// Statement completed; counts as reported by the backend.
    Completed { rows: u64, affected: u64 },
    /// Backend failure (truncated to 512 bytes).
    Error(String),
}

impl QueryEvent {
    /// Create an error event, truncating the message.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryEvent::Error(_))
    }
}

impl fmt::Display for QueryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryEvent::Completed { rows, affected } => {
                write!(f, "{rows} rows, {affected} affected")
            }
            QueryEvent::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Trait for observing statement execution.
pub trait QueryMonitor: Send + Sync {
    /// Called before a statement is sent.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes (success or failure).
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, event: &QueryEvent);

    /// Called when safemode refuses a statement. Nothing was sent.
    fn on_guard_rejected(&self, _table: &str) {}
}
