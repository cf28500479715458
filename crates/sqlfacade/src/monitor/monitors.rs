use super::{SQL_TARGET, truncate_for_log};
use super::types::{QueryContext, QueryEvent, QueryMonitor, QueryType};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A no-op monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _event: &QueryEvent) {}
}

/// A monitor that tracks statement statistics.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    guard_rejected: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
}

/// Collected statement statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Statements sent to the backend.
    pub total_queries: u64,
    /// Statements the backend rejected.
    pub failed_queries: u64,
    /// Total execution time.
    pub total_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    /// UPDATE/DELETE calls refused by safemode.
    pub guard_rejected: u64,
    /// Slowest statement duration.
    pub max_duration: Duration,
    /// Slowest statement SQL.
    pub slowest_query: Option<String>,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            guard_rejected: self.guard_rejected.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .map(|slowest| slowest.clone())
                .unwrap_or_default(),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.total_duration_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.guard_rejected,
            &self.max_duration_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        if let Ok(mut slowest) = self.slowest_query.lock() {
            *slowest = None;
        }
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, event: &QueryEvent) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);

        match ctx.query_type {
            QueryType::Select => self.select_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Insert => self.insert_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Update => self.update_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Delete => self.delete_count.fetch_add(1, Ordering::Relaxed),
            QueryType::Other => 0,
        };

        if event.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        let prev_max = self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed);
        if nanos > prev_max {
            if let Ok(mut slowest) = self.slowest_query.lock() {
                *slowest = Some(ctx.sql.clone());
            }
        }
    }

    fn on_guard_rejected(&self, _table: &str) {
        self.guard_rejected.fetch_add(1, Ordering::Relaxed);
    }
}

/// A monitor that emits `tracing` events on the `sqlfacade.sql` target.
///
/// Failures are always logged at `ERROR` and guard rejections at `WARN`;
/// completed statements use the configured level.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Level for completed statements.
    pub level: tracing::Level,
    /// Maximum SQL length to log. `None` logs the full statement.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        truncate_for_log(sql, self.max_sql_length)
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, event: &QueryEvent) {
        let sql = self.truncate_sql(&ctx.sql);
        let duration_ms = duration.as_secs_f64() * 1000.0;
        match event {
            QueryEvent::Completed { rows, affected } => {
                super::emit_at_level!(
                    self.level,
                    target: SQL_TARGET,
                    backend = %ctx.db_type,
                    query_type = ?ctx.query_type,
                    duration_ms,
                    rows,
                    affected,
                    sql = %sql,
                    "statement completed"
                );
            }
            QueryEvent::Error(message) => {
                tracing::error!(
                    target: SQL_TARGET,
                    backend = %ctx.db_type,
                    query_type = ?ctx.query_type,
                    duration_ms,
                    error = %message,
                    sql = %sql,
                    "statement failed"
                );
            }
        }
    }

    fn on_guard_rejected(&self, table: &str) {
        tracing::warn!(
            target: SQL_TARGET,
            table,
            "safemode refused a statement without WHERE conditions"
        );
    }
}
