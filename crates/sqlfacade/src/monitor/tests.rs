use super::*;
use crate::config::DbType;
use std::time::Duration;

#[test]
fn test_query_type_detection() {
    assert_eq!(
        QueryType::from_sql("SELECT * FROM users"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("  select * FROM users"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("WITH cte AS (SELECT 1) SELECT * FROM cte"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("INSERT INTO users (name) VALUES ('a')"),
        QueryType::Insert
    );
    assert_eq!(
        QueryType::from_sql("UPDATE users SET name = 'a' WHERE id = '1'"),
        QueryType::Update
    );
    assert_eq!(
        QueryType::from_sql("DELETE FROM users WHERE id = '1'"),
        QueryType::Delete
    );
    assert_eq!(
        QueryType::from_sql("CREATE TABLE users (id INT)"),
        QueryType::Other
    );
}

#[test]
fn test_query_type_skips_comments() {
    assert_eq!(
        QueryType::from_sql("-- lookup\nSELECT 1"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("/* bulk */ DELETE FROM t WHERE a = '1'"),
        QueryType::Delete
    );
    assert_eq!(
        QueryType::from_sql("WITH x AS (SELECT ')') DELETE FROM t"),
        QueryType::Delete
    );
}

#[test]
fn test_truncation() {
    let monitor = TracingMonitor::new().max_sql_length(10);
    assert_eq!(monitor.truncate_sql("SELECT * FROM users"), "SELECT * F...");
    assert_eq!(monitor.truncate_sql("SELECT 1"), "SELECT 1");
    assert_eq!(truncate_sql_bytes("héllo", 2), "h");
}

#[test]
fn test_error_event_is_truncated() {
    let event = QueryEvent::error("x".repeat(600));
    match event {
        QueryEvent::Error(msg) => assert_eq!(msg.len(), 515),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn test_stats_monitor() {
    let monitor = StatsMonitor::new();
    let select = QueryContext::new("SELECT * FROM users", DbType::Mysql);
    let delete = QueryContext::new("DELETE FROM users WHERE id = '1'", DbType::Mysql);

    monitor.on_query_complete(
        &select,
        Duration::from_millis(10),
        &QueryEvent::Completed { rows: 5, affected: 0 },
    );
    monitor.on_query_complete(
        &delete,
        Duration::from_millis(20),
        &QueryEvent::error("deadlock"),
    );
    monitor.on_guard_rejected("users");

    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 2);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.select_count, 1);
    assert_eq!(stats.delete_count, 1);
    assert_eq!(stats.guard_rejected, 1);
    assert_eq!(stats.total_duration, Duration::from_millis(30));
    assert_eq!(stats.max_duration, Duration::from_millis(20));
    assert_eq!(
        stats.slowest_query.as_deref(),
        Some("DELETE FROM users WHERE id = '1'")
    );

    monitor.reset();
    assert_eq!(monitor.stats(), QueryStats::default());
}

#[test]
fn test_monitors_are_object_safe() {
    let monitors: Vec<Box<dyn QueryMonitor>> = vec![
        Box::new(NoopMonitor),
        Box::new(StatsMonitor::new()),
        Box::new(TracingMonitor::new()),
    ];
    let ctx = QueryContext::new("SELECT 1", DbType::Pgsql);
    for m in &monitors {
        m.on_query_start(&ctx);
        m.on_query_complete(
            &ctx,
            Duration::from_millis(1),
            &QueryEvent::Completed { rows: 1, affected: 0 },
        );
    }
}
