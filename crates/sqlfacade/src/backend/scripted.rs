//! In-memory backend for tests: records every statement and replays
//! scripted responses in order.

use super::Backend;
use crate::config::DbType;
use crate::error::{DbError, DbResult};
use crate::result::{ResultHandle, Row};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) enum Reply {
    Rows(Vec<&'static str>, Vec<Vec<Option<&'static str>>>),
    Affected(u64),
    Fail(&'static str),
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    pub(crate) sent: Vec<String>,
    replies: VecDeque<Reply>,
    affected: u64,
    last_error: Option<String>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }
}

impl Backend for ScriptedBackend {
    fn db_type(&self) -> DbType {
        DbType::Mysql
    }

    async fn run(&mut self, sql: &str) -> DbResult<ResultHandle> {
        self.sent.push(sql.to_string());
        self.affected = 0;
        match self.replies.pop_front().unwrap_or(Reply::Affected(0)) {
            Reply::Rows(names, values) => {
                self.last_error = None;
                let columns: Arc<[String]> = names.iter().map(|c| c.to_string()).collect();
                let rows = values
                    .into_iter()
                    .map(|vals| {
                        let vals = vals.into_iter().map(|v| v.map(str::to_string)).collect();
                        Row::new(columns.clone(), vals)
                    })
                    .collect();
                Ok(ResultHandle::new(columns, rows, 0))
            }
            Reply::Affected(n) => {
                self.last_error = None;
                self.affected = n;
                Ok(ResultHandle::affected_only(n))
            }
            Reply::Fail(message) => {
                self.last_error = Some(message.to_string());
                Err(DbError::statement(DbType::Mysql, message))
            }
        }
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn close(self) -> DbResult<()> {
        Ok(())
    }
}
