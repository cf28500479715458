use super::{Backend, track};
use crate::config::{ConnectionConfig, DbType};
use crate::error::{DbError, DbResult};
use crate::result::{ResultHandle, Row};
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Either, Row as _};
use std::fmt;
use std::sync::Arc;

/// MySQL over `sqlx`, serving both the `mysql` and `mysqli` tags.
///
/// SQL is sent with [`sqlx::raw_sql`], the text protocol, so values decode
/// as strings.
pub struct MySqlBackend {
    conn: MySqlConnection,
    db_type: DbType,
    affected: u64,
    last_error: Option<String>,
}

impl MySqlBackend {
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.effective_port())
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| DbError::connection(config.db_type, e))?;

        Ok(Self::from_connection(conn, config.db_type))
    }

    /// Wrap an open connection. `db_type` is reported as given.
    pub fn from_connection(conn: MySqlConnection, db_type: DbType) -> Self {
        Self {
            conn,
            db_type,
            affected: 0,
            last_error: None,
        }
    }
}

impl fmt::Debug for MySqlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlBackend")
            .field("db_type", &self.db_type)
            .field("affected", &self.affected)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl Backend for MySqlBackend {
    fn db_type(&self) -> DbType {
        self.db_type
    }

    async fn run(&mut self, sql: &str) -> DbResult<ResultHandle> {
        self.affected = 0;
        let result = sqlx::raw_sql(sql)
            .fetch_many(&mut self.conn)
            .try_collect::<Vec<_>>()
            .await;
        let items = track(self.db_type, &mut self.last_error, result)?;

        let mut columns: Option<Arc<[String]>> = None;
        let mut rows = Vec::new();
        let mut affected = 0;
        for item in items {
            match item {
                Either::Left(done) => affected += done.rows_affected(),
                Either::Right(row) => {
                    let columns = columns
                        .get_or_insert_with(|| {
                            row.columns().iter().map(|c| c.name().to_string()).collect()
                        })
                        .clone();
                    rows.push(Row::new(columns, row_values(&row)));
                }
            }
        }

        self.affected = affected;
        Ok(ResultHandle::new(
            columns.unwrap_or_else(|| Arc::from(Vec::new())),
            rows,
            affected,
        ))
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn close(self) -> DbResult<()> {
        let db_type = self.db_type;
        self.conn
            .close()
            .await
            .map_err(|e| DbError::connection(db_type, e))
    }
}

fn row_values(row: &MySqlRow) -> Vec<Option<String>> {
    (0..row.len())
        .map(|i| match row.try_get_unchecked::<Option<String>, _>(i) {
            Ok(value) => value,
            Err(_) => row
                .try_get_unchecked::<Option<Vec<u8>>, _>(i)
                .ok()
                .flatten()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
        })
        .collect()
}
