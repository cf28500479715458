use super::{Backend, track};
use crate::config::{ConnectionConfig, DbType};
use crate::error::{DbError, DbResult};
use crate::monitor::QueryType;
use crate::result::{ResultHandle, Row};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::sync::Arc;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// MS SQL Server over `tiberius`, serving both the `mssql` and `sqlserv` tags.
///
/// SELECT statements (including CTE-led ones) run through `simple_query`;
/// everything else runs through `execute` so the server reports affected
/// counts. Rows produced by other statements, such as `EXEC proc` or
/// `INSERT ... OUTPUT`, are not collected: [`Backend::run`] returns only the
/// affected count for them.
pub struct MssqlBackend {
    client: Client<Compat<TcpStream>>,
    db_type: DbType,
    affected: u64,
    last_error: Option<String>,
}

impl MssqlBackend {
    /// Connect with SQL Server authentication, trusting the server certificate.
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let db_type = config.db_type;
        let mut tds = Config::new();
        tds.host(&config.host);
        tds.port(config.effective_port());
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));
        tds.trust_cert();

        let tcp = TcpStream::connect(tds.get_addr())
            .await
            .map_err(|e| DbError::connection(db_type, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| DbError::connection(db_type, e))?;

        let client = Client::connect(tds, tcp.compat_write())
            .await
            .map_err(|e| DbError::connection(db_type, e))?;

        Ok(Self {
            client,
            db_type,
            affected: 0,
            last_error: None,
        })
    }
}

impl fmt::Debug for MssqlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlBackend")
            .field("db_type", &self.db_type)
            .field("affected", &self.affected)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl Backend for MssqlBackend {
    fn db_type(&self) -> DbType {
        self.db_type
    }

    async fn run(&mut self, sql: &str) -> DbResult<ResultHandle> {
        self.affected = 0;

        if !QueryType::from_sql(sql).returns_rows() {
            let result = self.client.execute(sql, &[]).await;
            let done = track(self.db_type, &mut self.last_error, result)?;
            self.affected = done.rows_affected().iter().sum();
            return Ok(ResultHandle::affected_only(self.affected));
        }

        let result = match self.client.simple_query(sql).await {
            Ok(stream) => stream.into_first_result().await,
            Err(e) => Err(e),
        };
        let tds_rows = track(self.db_type, &mut self.last_error, result)?;

        let columns: Arc<[String]> = match tds_rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => Arc::from(Vec::new()),
        };
        let rows = tds_rows
            .into_iter()
            .map(|row| Row::new(columns.clone(), row.into_iter().map(column_text).collect()))
            .collect();

        Ok(ResultHandle::new(columns, rows, 0))
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn close(self) -> DbResult<()> {
        let db_type = self.db_type;
        self.client
            .close()
            .await
            .map_err(|e| DbError::connection(db_type, e))
    }
}

/// Render one column value as text. Temporal values use chrono's ISO 8601
/// rendering (`2021-07-30 13:45:00`, `+02:00` offsets).
fn column_text(data: ColumnData<'static>) -> Option<String> {
    match data {
        ColumnData::U8(v) => v.map(|n| n.to_string()),
        ColumnData::I16(v) => v.map(|n| n.to_string()),
        ColumnData::I32(v) => v.map(|n| n.to_string()),
        ColumnData::I64(v) => v.map(|n| n.to_string()),
        ColumnData::F32(v) => v.map(|n| n.to_string()),
        ColumnData::F64(v) => v.map(|n| n.to_string()),
        ColumnData::Bit(v) => v.map(|b| String::from(if b { "1" } else { "0" })),
        ColumnData::String(v) => v.map(|s| s.into_owned()),
        ColumnData::Guid(v) => v.map(|g| g.to_string()),
        ColumnData::Numeric(v) => v.map(|n| n.to_string()),
        ColumnData::Binary(v) => v.map(|b| String::from_utf8_lossy(&b).into_owned()),
        ColumnData::Xml(v) => v.map(|x| x.into_owned().into_string()),
        dt @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => temporal_text::<NaiveDateTime>(&dt),
        date @ ColumnData::Date(_) => temporal_text::<NaiveDate>(&date),
        time @ ColumnData::Time(_) => temporal_text::<NaiveTime>(&time),
        dto @ ColumnData::DateTimeOffset(_) => temporal_text::<DateTime<FixedOffset>>(&dto),
    }
}

fn temporal_text<'a, T>(data: &'a ColumnData<'static>) -> Option<String>
where
    T: FromSql<'a> + fmt::Display,
{
    T::from_sql(data).ok().flatten().map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tiberius::numeric::Numeric;
    use tiberius::time::{
        Date, DateTime as TdsDateTime, DateTime2, DateTimeOffset, SmallDateTime, Time,
    };
    use tiberius::xml::XmlData;

    #[test]
    fn test_scalar_columns() {
        assert_eq!(column_text(ColumnData::U8(Some(7))), Some("7".to_string()));
        assert_eq!(column_text(ColumnData::I16(Some(-3))), Some("-3".to_string()));
        assert_eq!(column_text(ColumnData::I32(Some(42))), Some("42".to_string()));
        assert_eq!(
            column_text(ColumnData::I64(Some(1 << 40))),
            Some("1099511627776".to_string())
        );
        assert_eq!(column_text(ColumnData::F32(Some(1.5))), Some("1.5".to_string()));
        assert_eq!(column_text(ColumnData::F64(Some(0.25))), Some("0.25".to_string()));
        assert_eq!(column_text(ColumnData::Bit(Some(true))), Some("1".to_string()));
        assert_eq!(column_text(ColumnData::Bit(Some(false))), Some("0".to_string()));
        assert_eq!(
            column_text(ColumnData::String(Some(Cow::from("ann")))),
            Some("ann".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Guid(Some(tiberius::Uuid::nil()))),
            Some("00000000-0000-0000-0000-000000000000".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Numeric(Some(Numeric::new_with_scale(12345, 2)))),
            Some("123.45".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Binary(Some(Cow::from(b"abc".to_vec())))),
            Some("abc".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Xml(Some(Cow::Owned(XmlData::new("<a>1</a>"))))),
            Some("<a>1</a>".to_string())
        );
    }

    #[test]
    fn test_temporal_columns_render_iso_text() {
        assert_eq!(
            column_text(ColumnData::DateTime2(Some(DateTime2::new(
                Date::new(738000),
                Time::new(0, 7)
            )))),
            Some("2021-07-30 00:00:00".to_string())
        );
        assert_eq!(
            column_text(ColumnData::DateTime(Some(TdsDateTime::new(0, 300)))),
            Some("1900-01-01 00:00:01".to_string())
        );
        assert_eq!(
            column_text(ColumnData::SmallDateTime(Some(SmallDateTime::new(1, 60)))),
            Some("1900-01-02 01:00:00".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Date(Some(Date::new(738000)))),
            Some("2021-07-30".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Time(Some(Time::new(36_000_000_000, 7)))),
            Some("01:00:00".to_string())
        );

        let dto = column_text(ColumnData::DateTimeOffset(Some(DateTimeOffset::new(
            DateTime2::new(Date::new(738000), Time::new(0, 7)),
            120,
        ))))
        .unwrap();
        assert!(dto.starts_with("2021-07-30"), "{dto}");
        assert!(dto.ends_with("+02:00"), "{dto}");
    }

    #[test]
    fn test_null_columns() {
        let nulls = [
            ColumnData::U8(None),
            ColumnData::I16(None),
            ColumnData::I32(None),
            ColumnData::I64(None),
            ColumnData::F32(None),
            ColumnData::F64(None),
            ColumnData::Bit(None),
            ColumnData::String(None),
            ColumnData::Guid(None),
            ColumnData::Numeric(None),
            ColumnData::Binary(None),
            ColumnData::Xml(None),
            ColumnData::DateTime(None),
            ColumnData::SmallDateTime(None),
            ColumnData::DateTime2(None),
            ColumnData::Date(None),
            ColumnData::Time(None),
            ColumnData::DateTimeOffset(None),
        ];
        for data in nulls {
            let debug = format!("{data:?}");
            assert_eq!(column_text(data), None, "{debug}");
        }
    }
}
