use super::{Backend, track};
use crate::config::{ConnectionConfig, DbType};
use crate::error::{DbError, DbResult};
use crate::monitor::SQL_TARGET;
use crate::result::{ResultHandle, Row};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// PostgreSQL over `tokio-postgres`.
///
/// Statements go through the simple-query protocol, so literal SQL runs
/// unprepared and every value arrives as text.
pub struct PgBackend {
    client: Client,
    connection: Option<JoinHandle<()>>,
    affected: u64,
    last_error: Option<String>,
}

impl PgBackend {
    /// Connect without TLS and drive the connection on a spawned task.
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(config.host.as_str())
            .port(config.effective_port())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .dbname(config.database.as_str());

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| DbError::connection(DbType::Pgsql, e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: SQL_TARGET, error = %e, "postgres connection closed");
            }
        });

        Ok(Self {
            client,
            connection: Some(handle),
            affected: 0,
            last_error: None,
        })
    }

    /// Wrap a client whose connection is already being driven elsewhere.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            connection: None,
            affected: 0,
            last_error: None,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl fmt::Debug for PgBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgBackend")
            .field("affected", &self.affected)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl Backend for PgBackend {
    fn db_type(&self) -> DbType {
        DbType::Pgsql
    }

    async fn run(&mut self, sql: &str) -> DbResult<ResultHandle> {
        self.affected = 0;
        let result = self.client.simple_query(sql).await;
        let messages = track(DbType::Pgsql, &mut self.last_error, result)?;
        let handle = collect_messages(messages);
        self.affected = handle.affected();
        Ok(handle)
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn close(self) -> DbResult<()> {
        let Self {
            client, connection, ..
        } = self;
        drop(client);
        if let Some(connection) = connection {
            connection
                .await
                .map_err(|e| DbError::Other(format!("postgres connection task failed: {e}")))?;
        }
        Ok(())
    }
}

fn collect_messages(messages: Vec<SimpleQueryMessage>) -> ResultHandle {
    let mut fold = ResultFold::default();
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(desc) => {
                fold.columns(desc.iter().map(|c| c.name().to_string()).collect());
            }
            SimpleQueryMessage::Row(row) => {
                fold.row(
                    (0..row.len())
                        .map(|i| row.get(i).map(str::to_string))
                        .collect(),
                );
            }
            SimpleQueryMessage::CommandComplete(n) => fold.complete(n),
            _ => {}
        }
    }
    fold.finish()
}

/// Accumulates the results of one simple-query round trip.
///
/// Rows come from the last result set; only statements without a result set
/// (no row description) add to the affected count, so `RETURNING` rows are
/// not counted twice.
#[derive(Debug, Default)]
struct ResultFold {
    columns: Option<Arc<[String]>>,
    rows: Vec<Row>,
    affected: u64,
    in_result_set: bool,
}

impl ResultFold {
    fn columns(&mut self, names: Arc<[String]>) {
        self.columns = Some(names);
        self.rows.clear();
        self.in_result_set = true;
    }

    fn row(&mut self, values: Vec<Option<String>>) {
        let columns = self
            .columns
            .get_or_insert_with(|| Arc::from(Vec::new()))
            .clone();
        self.rows.push(Row::new(columns, values));
    }

    fn complete(&mut self, count: u64) {
        if !self.in_result_set {
            self.affected += count;
        }
        self.in_result_set = false;
    }

    fn finish(self) -> ResultHandle {
        let columns = self.columns.unwrap_or_else(|| Arc::from(Vec::new()));
        ResultHandle::new(columns, self.rows, self.affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Arc<[String]> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_select_counts_rows_not_affected() {
        let mut fold = ResultFold::default();
        fold.columns(names(&["id", "name"]));
        fold.row(vec![Some("1".into()), Some("ann".into())]);
        fold.row(vec![Some("2".into()), None]);
        fold.complete(2);

        let mut handle = fold.finish();
        assert_eq!(handle.row_count(), 2);
        assert_eq!(handle.affected(), 0);
        assert_eq!(handle.columns(), ["id", "name"]);
        let first = handle.next_row().unwrap();
        assert_eq!(first.get("name"), Some("ann"));
        assert_eq!(handle.next_row().unwrap().get("name"), None);
    }

    #[test]
    fn test_write_counts_affected() {
        let mut fold = ResultFold::default();
        fold.complete(3);

        let handle = fold.finish();
        assert_eq!(handle.row_count(), 0);
        assert_eq!(handle.affected(), 3);
        assert!(handle.columns().is_empty());
    }

    #[test]
    fn test_returning_rows_do_not_add_to_affected() {
        let mut fold = ResultFold::default();
        fold.columns(names(&["id"]));
        fold.row(vec![Some("9".into())]);
        fold.complete(1);

        let handle = fold.finish();
        assert_eq!(handle.row_count(), 1);
        assert_eq!(handle.affected(), 0);
    }

    #[test]
    fn test_multi_statement_keeps_last_result_set() {
        let mut fold = ResultFold::default();
        fold.complete(2);
        fold.columns(names(&["a"]));
        fold.row(vec![Some("x".into())]);
        fold.complete(1);
        fold.columns(names(&["b"]));
        fold.row(vec![Some("y".into())]);
        fold.row(vec![Some("z".into())]);
        fold.complete(2);

        let handle = fold.finish();
        assert_eq!(handle.affected(), 2);
        assert_eq!(handle.row_count(), 2);
        assert_eq!(handle.columns(), ["b"]);
    }
}
