//! Statement monitoring.
//!
//! A [`Query`](crate::Query) reports every statement it sends to one
//! [`QueryMonitor`]. [`StatsMonitor`] aggregates counters, [`TracingMonitor`]
//! emits `tracing` events.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlfacade::monitor::StatsMonitor;
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let mut q = Query::connect(&config).await?.with_monitor_arc(stats.clone());
//! q.table("users");
//! q.select(&[]).await?;
//! assert_eq!(stats.stats().select_count, 1);
//! ```

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            tracing::Level::ERROR => tracing::error!($($field)*),
            tracing::Level::WARN  => tracing::warn!($($field)*),
            tracing::Level::INFO  => tracing::info!($($field)*),
            tracing::Level::DEBUG => tracing::debug!($($field)*),
            _ => tracing::trace!($($field)*),
        }
    };
}

pub(crate) use emit_at_level;

mod monitors;
mod types;

#[cfg(test)]
mod tests;

pub use monitors::{NoopMonitor, QueryStats, StatsMonitor, TracingMonitor};
pub use types::{QueryContext, QueryEvent, QueryMonitor, QueryType};

/// Log target for statement events.
pub const SQL_TARGET: &str = "sqlfacade.sql";

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Truncate for display, marking the cut with `...`.
pub(crate) fn truncate_for_log(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Strip leading whitespace, comments and parentheses to reach the first keyword.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => {
                    s = &s[pos + 1..];
                    continue;
                }
                None => return "",
            }
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => {
                    s = &s[pos + 2..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}
