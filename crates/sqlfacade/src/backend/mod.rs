//! Database backends.
//!
//! A [`Backend`] owns one live connection and turns literal SQL into a
//! [`ResultHandle`]. [`AnyBackend`] picks the concrete driver from
//! [`ConnectionConfig::db_type`].

mod postgres;

#[cfg(feature = "mysql")]
mod mysql;

#[cfg(feature = "mssql")]
mod mssql;

#[cfg(test)]
pub(crate) mod scripted;

pub use postgres::PgBackend;

#[cfg(feature = "mysql")]
pub use mysql::MySqlBackend;

#[cfg(feature = "mssql")]
pub use mssql::MssqlBackend;

use crate::config::{ConnectionConfig, DbType};
use crate::error::DbResult;
#[cfg(not(all(feature = "mysql", feature = "mssql")))]
use crate::error::DbError;
use crate::result::{ResultHandle, Row};
use std::future::Future;

/// One connection to a database server.
///
/// Counts are reported for the most recent [`Backend::run`]; the handle it
/// returned carries the rows.
pub trait Backend: Send {
    /// The backend family this connection speaks.
    fn db_type(&self) -> DbType;

    /// Send literal SQL and buffer whatever it produced.
    ///
    /// A failure is returned as [`DbError::Statement`](crate::DbError::Statement)
    /// and its text is kept for [`Backend::last_error`].
    fn run(&mut self, sql: &str) -> impl Future<Output = DbResult<ResultHandle>> + Send;

    /// Rows in the result set behind `handle`.
    fn row_count(&self, handle: &ResultHandle) -> u64 {
        handle.row_count()
    }

    /// Rows affected by the most recent statement.
    fn affected_rows(&self) -> u64;

    /// Advance `handle` by one row.
    fn fetch_one(&self, handle: &mut ResultHandle) -> Option<Row> {
        handle.next_row()
    }

    /// Native error text of the most recent statement, if it failed.
    fn last_error(&self) -> Option<&str>;

    /// Disconnect.
    fn close(self) -> impl Future<Output = DbResult<()>> + Send
    where
        Self: Sized;
}

/// A backend chosen at runtime from the configured `db_type`.
#[derive(Debug)]
pub enum AnyBackend {
    Postgres(PgBackend),
    #[cfg(feature = "mysql")]
    MySql(MySqlBackend),
    #[cfg(feature = "mssql")]
    Mssql(MssqlBackend),
}

impl AnyBackend {
    /// Connect to the server described by `config`.
    ///
    /// `mysql`/`mysqli` need the `mysql` feature and `mssql`/`sqlserv` the
    /// `mssql` feature; without it the call fails with a config error.
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        match config.db_type {
            DbType::Pgsql => Ok(Self::Postgres(PgBackend::connect(config).await?)),
            #[cfg(feature = "mysql")]
            DbType::Mysql | DbType::Mysqli => Ok(Self::MySql(MySqlBackend::connect(config).await?)),
            #[cfg(not(feature = "mysql"))]
            DbType::Mysql | DbType::Mysqli => Err(DbError::config(format!(
                "db_type '{}' requires the `mysql` feature",
                config.db_type
            ))),
            #[cfg(feature = "mssql")]
            DbType::Mssql | DbType::Sqlserv => {
                Ok(Self::Mssql(MssqlBackend::connect(config).await?))
            }
            #[cfg(not(feature = "mssql"))]
            DbType::Mssql | DbType::Sqlserv => Err(DbError::config(format!(
                "db_type '{}' requires the `mssql` feature",
                config.db_type
            ))),
        }
    }
}

impl Backend for AnyBackend {
    fn db_type(&self) -> DbType {
        match self {
            Self::Postgres(b) => b.db_type(),
            #[cfg(feature = "mysql")]
            Self::MySql(b) => b.db_type(),
            #[cfg(feature = "mssql")]
            Self::Mssql(b) => b.db_type(),
        }
    }

    async fn run(&mut self, sql: &str) -> DbResult<ResultHandle> {
        match self {
            Self::Postgres(b) => b.run(sql).await,
            #[cfg(feature = "mysql")]
            Self::MySql(b) => b.run(sql).await,
            #[cfg(feature = "mssql")]
            Self::Mssql(b) => b.run(sql).await,
        }
    }

    fn affected_rows(&self) -> u64 {
        match self {
            Self::Postgres(b) => b.affected_rows(),
            #[cfg(feature = "mysql")]
            Self::MySql(b) => b.affected_rows(),
            #[cfg(feature = "mssql")]
            Self::Mssql(b) => b.affected_rows(),
        }
    }

    fn last_error(&self) -> Option<&str> {
        match self {
            Self::Postgres(b) => b.last_error(),
            #[cfg(feature = "mysql")]
            Self::MySql(b) => b.last_error(),
            #[cfg(feature = "mssql")]
            Self::Mssql(b) => b.last_error(),
        }
    }

    async fn close(self) -> DbResult<()> {
        match self {
            Self::Postgres(b) => b.close().await,
            #[cfg(feature = "mysql")]
            Self::MySql(b) => b.close().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(b) => b.close().await,
        }
    }
}

impl From<PgBackend> for AnyBackend {
    fn from(backend: PgBackend) -> Self {
        Self::Postgres(backend)
    }
}

#[cfg(feature = "mysql")]
impl From<MySqlBackend> for AnyBackend {
    fn from(backend: MySqlBackend) -> Self {
        Self::MySql(backend)
    }
}

#[cfg(feature = "mssql")]
impl From<MssqlBackend> for AnyBackend {
    fn from(backend: MssqlBackend) -> Self {
        Self::Mssql(backend)
    }
}

/// Record the outcome of a driver call, keeping the native error text.
pub(crate) fn track<T, E: std::fmt::Display>(
    db_type: DbType,
    last_error: &mut Option<String>,
    result: Result<T, E>,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            *last_error = None;
            Ok(value)
        }
        Err(err) => {
            let message = err.to_string();
            *last_error = Some(message.clone());
            Err(crate::error::DbError::statement(db_type, message))
        }
    }
}
