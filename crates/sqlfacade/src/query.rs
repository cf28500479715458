//! The query facade: builder state plus one backend connection.

use crate::backend::{AnyBackend, Backend};
use crate::builder::{BuilderState, ClearScope, LimitSpec, OrderSpec, Rendered};
use crate::condition::ConditionSpec;
use crate::config::ConnectionConfig;
use crate::error::DbResult;
use crate::escape::Value;
use crate::monitor::{
    NoopMonitor, QueryContext, QueryEvent, QueryMonitor, SQL_TARGET, emit_at_level,
    truncate_for_log,
};
use crate::normalize::{SuccessSignal, normalize};
use crate::result::{ExecutionResult, Outcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Options for [`Query::exec_with`] and [`Query::select_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    signal: Option<SuccessSignal>,
    fetch_all: bool,
}

impl Default for ExecOptions {
    /// Signal `>`, fetch every row.
    fn default() -> Self {
        Self {
            signal: Some(SuccessSignal::Gt),
            fetch_all: true,
        }
    }
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults used by `select`: signal `>=`, fetch every row.
    pub fn for_select() -> Self {
        Self {
            signal: Some(SuccessSignal::Ge),
            fetch_all: true,
        }
    }

    pub fn signal(mut self, signal: SuccessSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Set the signal from its textual form. An unrecognized signal makes
    /// every execution report `success == false`.
    pub fn signal_str(mut self, signal: &str) -> Self {
        self.signal = SuccessSignal::parse(signal);
        self
    }

    /// `false` fetches only the first row.
    pub fn fetch_all(mut self, fetch_all: bool) -> Self {
        self.fetch_all = fetch_all;
        self
    }
}

/// Options for `insert_with`, `update_with` and `delete_with`.
///
/// Defaults: safemode on, escaping on, quoted values, signal `>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    safemode: bool,
    escape: bool,
    literal: bool,
    signal: Option<SuccessSignal>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            safemode: true,
            escape: true,
            literal: false,
            signal: Some(SuccessSignal::Gt),
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse UPDATE/DELETE without WHERE conditions. Ignored by INSERT.
    pub fn safemode(mut self, safemode: bool) -> Self {
        self.safemode = safemode;
        self
    }

    pub fn escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    /// Emit values unquoted and unescaped. Ignored by DELETE.
    pub fn literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    pub fn signal(mut self, signal: SuccessSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn signal_str(mut self, signal: &str) -> Self {
        self.signal = SuccessSignal::parse(signal);
        self
    }
}

/// Builds literal SQL from accumulated state and runs it on one backend.
///
/// Builder state (table, conditions, ordering, limit, group-by) persists
/// across statements until [`Query::clear`] resets it.
///
/// # Example
///
/// ```ignore
/// use sqlfacade::{ConnectionConfig, DbType, Direction, Query};
///
/// let config = ConnectionConfig::new().db_type(DbType::Pgsql);
/// let mut q = Query::connect(&config).await?;
/// q.table("users")
///     .and_where(("active", 1))
///     .order(("created_at", Direction::Desc))
///     .limit(10);
/// let outcome = q.select(&["id", "name"]).await?;
/// ```
pub struct Query<B: Backend = AnyBackend> {
    backend: B,
    state: BuilderState,
    last: Option<ExecutionResult>,
    monitor: Arc<dyn QueryMonitor>,
    debug: bool,
    max_sql_length: Option<usize>,
    created: Instant,
}

impl Query<AnyBackend> {
    /// Connect with `config` and return a facade over the chosen backend.
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let backend = match AnyBackend::connect(config).await {
            Ok(backend) => backend,
            Err(err) => {
                tracing::error!(
                    target: SQL_TARGET,
                    backend = %config.db_type,
                    host = %config.host,
                    error = %err,
                    "connect failed"
                );
                return Err(err);
            }
        };
        tracing::debug!(
            target: SQL_TARGET,
            backend = %config.db_type,
            host = %config.host,
            database = %config.database,
            "connected"
        );
        Ok(Self::new(backend).debug(config.debug))
    }
}

impl<B: Backend> Query<B> {
    /// Wrap an already connected backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: BuilderState::new(),
            last: None,
            monitor: Arc::new(NoopMonitor),
            debug: false,
            max_sql_length: Some(200),
            created: Instant::now(),
        }
    }

    pub fn with_monitor(self, monitor: impl QueryMonitor + 'static) -> Self {
        self.with_monitor_arc(Arc::new(monitor))
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Log statements at INFO instead of DEBUG.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Truncate logged SQL to `len` bytes.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ==================== Builder state ====================

    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.state.table(name);
        self
    }

    /// Add a WHERE condition: `(field, value)`, `(field, value, op)`,
    /// `(field, value, op, escape)`, `(field, value, op, escape, literal)`
    /// or a [`ConditionSpec`].
    pub fn and_where(&mut self, spec: impl Into<ConditionSpec>) -> &mut Self {
        self.state.and_where(spec);
        self
    }

    pub fn and_where_all<I, S>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConditionSpec>,
    {
        self.state.and_where_all(specs);
        self
    }

    pub fn order(&mut self, spec: impl Into<OrderSpec>) -> &mut Self {
        self.state.order(spec);
        self
    }

    pub fn order_all<I, S>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OrderSpec>,
    {
        self.state.order_all(specs);
        self
    }

    pub fn limit(&mut self, limit: impl Into<LimitSpec>) -> &mut Self {
        self.state.limit(limit);
        self
    }

    pub fn group_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.state.group_by(expr);
        self
    }

    /// Reset one scope (`"limit"`, `"group_by"`, `"where"`, `"order"`);
    /// anything else resets all four.
    pub fn clear(&mut self, scope: impl Into<ClearScope>) -> &mut Self {
        self.state.clear(scope);
        self
    }

    pub fn clear_all(&mut self) -> &mut Self {
        self.state.clear(ClearScope::All);
        self
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    // ==================== Statements ====================

    /// Run `SELECT` with signal `>=`, fetching every row. Empty `fields`
    /// selects `*`.
    pub async fn select(&mut self, fields: &[&str]) -> DbResult<Outcome> {
        self.select_with(fields, ExecOptions::for_select()).await
    }

    pub async fn select_with(&mut self, fields: &[&str], opts: ExecOptions) -> DbResult<Outcome> {
        let sql = self.state.render_select(fields);
        self.execute(sql, opts.signal, opts.fetch_all).await
    }

    pub async fn insert<I, K, V>(&mut self, values: I) -> DbResult<Outcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert_with(values, WriteOptions::default()).await
    }

    pub async fn insert_with<I, K, V>(&mut self, values: I, opts: WriteOptions) -> DbResult<Outcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values = crate::builder::fields(values);
        let rendered = self.state.render_insert(values, opts.escape, opts.literal);
        self.execute_rendered(rendered, opts.signal).await
    }

    /// Run `UPDATE` with safemode on.
    pub async fn update<I, K, V>(&mut self, values: I) -> DbResult<Outcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.update_with(values, WriteOptions::default()).await
    }

    pub async fn update_with<I, K, V>(&mut self, values: I, opts: WriteOptions) -> DbResult<Outcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values = crate::builder::fields(values);
        let rendered = self
            .state
            .render_update(values, opts.safemode, opts.escape, opts.literal);
        self.execute_rendered(rendered, opts.signal).await
    }

    /// Run `DELETE` with safemode on.
    pub async fn delete(&mut self) -> DbResult<Outcome> {
        self.delete_with(WriteOptions::default()).await
    }

    pub async fn delete_with(&mut self, opts: WriteOptions) -> DbResult<Outcome> {
        let rendered = self.state.render_delete(opts.safemode);
        self.execute_rendered(rendered, opts.signal).await
    }

    /// Run raw SQL with signal `>`, fetching every row.
    ///
    /// Non-empty `sql` becomes the current statement; empty `sql` re-runs the
    /// last rendered statement, or returns [`Outcome::EmptyStatement`] if there
    /// is none.
    pub async fn exec(&mut self, sql: &str) -> DbResult<Outcome> {
        self.exec_with(sql, ExecOptions::default()).await
    }

    pub async fn exec_with(&mut self, sql: &str, opts: ExecOptions) -> DbResult<Outcome> {
        if !sql.is_empty() {
            self.state.set_sql(sql);
        }
        let sql = self.state.sql().to_string();
        if sql.is_empty() {
            tracing::debug!(target: SQL_TARGET, "exec called with nothing to run");
            return Ok(Outcome::EmptyStatement);
        }
        self.execute(sql, opts.signal, opts.fetch_all).await
    }

    // ==================== Inspection ====================

    /// The last rendered or executed SQL.
    pub fn sql(&self) -> &str {
        self.state.sql()
    }

    /// Snapshot of the last successful execution.
    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last.as_ref()
    }

    /// Native error text of the last statement, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.backend.last_error()
    }

    /// Time since this facade was created.
    pub fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    /// Disconnect from the server.
    pub async fn close(self) -> DbResult<()> {
        self.backend.close().await
    }

    // ==================== Execution ====================

    async fn execute_rendered(
        &mut self,
        rendered: Rendered,
        signal: Option<SuccessSignal>,
    ) -> DbResult<Outcome> {
        match rendered {
            Rendered::Statement(sql) => self.execute(sql, signal, false).await,
            Rendered::GuardRejected => {
                let table = self.state.table_name();
                tracing::warn!(
                    target: SQL_TARGET,
                    table,
                    "safemode refused a statement without WHERE conditions"
                );
                self.monitor.on_guard_rejected(table);
                Ok(Outcome::GuardRejected)
            }
            Rendered::Empty => {
                tracing::debug!(
                    target: SQL_TARGET,
                    table = self.state.table_name(),
                    "no fields to write"
                );
                Ok(Outcome::EmptyStatement)
            }
        }
    }

    async fn execute(
        &mut self,
        sql: String,
        signal: Option<SuccessSignal>,
        fetch_all: bool,
    ) -> DbResult<Outcome> {
        let started = Instant::now();
        let ctx = QueryContext::new(&sql, self.backend.db_type());
        self.monitor.on_query_start(&ctx);

        let handle = match self.backend.run(&sql).await {
            Ok(handle) => handle,
            Err(err) => {
                let elapsed = started.elapsed();
                self.monitor
                    .on_query_complete(&ctx, elapsed, &QueryEvent::error(err.to_string()));
                tracing::error!(
                    target: SQL_TARGET,
                    backend = %ctx.db_type,
                    query_type = ?ctx.query_type,
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    error = %err,
                    sql = %truncate_for_log(&ctx.sql, self.max_sql_length),
                    "statement failed"
                );
                return Err(err);
            }
        };

        let result = normalize(&self.backend, sql, handle, signal, fetch_all, started);
        self.monitor.on_query_complete(
            &ctx,
            result.elapsed,
            &QueryEvent::Completed {
                rows: result.row_count,
                affected: result.affected_rows,
            },
        );

        let level = if self.debug {
            tracing::Level::INFO
        } else {
            tracing::Level::DEBUG
        };
        emit_at_level!(
            level,
            target: SQL_TARGET,
            backend = %ctx.db_type,
            query_type = ?ctx.query_type,
            rows = result.row_count,
            affected = result.affected_rows,
            success = result.success,
            duration_ms = result.elapsed.as_secs_f64() * 1000.0,
            sql = %truncate_for_log(&ctx.sql, self.max_sql_length),
            "statement executed"
        );

        self.last = Some(result.clone());
        Ok(Outcome::Executed(result))
    }
}
