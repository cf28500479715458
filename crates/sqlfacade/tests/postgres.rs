use sqlfacade::{DbError, DbResult, Direction, PgBackend, Query, WriteOptions};
use tokio_postgres::NoTls;

async fn connect() -> DbResult<Option<Query<PgBackend>>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping postgres round trip");
            return Ok(None);
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(|e| DbError::connection(sqlfacade::DbType::Pgsql, e))?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    Ok(Some(Query::new(PgBackend::from_client(client))))
}

#[tokio::test]
async fn postgres_round_trip() -> DbResult<()> {
    let Some(mut q) = connect().await? else {
        return Ok(());
    };

    let created = q
        .exec("CREATE TEMP TABLE facade_users (id INT PRIMARY KEY, name TEXT, active INT)")
        .await?;
    assert!(created.executed().is_some());

    q.table("facade_users");
    for (id, name) in [(1, "ann"), (2, "bob"), (3, "cy")] {
        let outcome = q
            .insert([
                ("id", id.to_string()),
                ("name", name.to_string()),
                ("active", "1".to_string()),
            ])
            .await?;
        assert!(outcome.is_success());
        assert_eq!(outcome.executed().map(|r| r.affected_rows), Some(1));
    }

    q.and_where(("name", "bob"));
    let outcome = q.select(&["id", "name"]).await?;
    let result = outcome.executed().expect("select ran");
    assert_eq!(result.row_count, 1);
    assert_eq!(
        result.fetch.first().and_then(|r| r.get("id")),
        Some("2")
    );

    q.clear("where");
    assert!(q.update([("active", 0)]).await?.is_guard_rejected());

    q.and_where(("id", 2, ">="));
    let outcome = q.update([("active", 0)]).await?;
    assert_eq!(outcome.executed().map(|r| r.affected_rows), Some(2));

    q.clear_all().order(("id", Direction::Desc)).limit(2);
    let outcome = q.select(&["id"]).await?;
    let ids: Vec<_> = outcome
        .into_executed()
        .expect("select ran")
        .fetch
        .into_rows()
        .iter()
        .filter_map(|r| r.get("id").map(str::to_string))
        .collect();
    assert_eq!(ids, ["3", "2"]);

    let err = q.exec("SELECT * FROM missing_table").await.unwrap_err();
    assert!(err.is_statement());
    assert!(q.last_error().is_some());

    q.clear_all();
    let outcome = q.delete_with(WriteOptions::new().safemode(false)).await?;
    assert_eq!(outcome.executed().map(|r| r.affected_rows), Some(3));

    q.close().await
}
