mod common;

use std::time::Duration;

use clusterterm::snapshot::{run_snapshot, SnapshotOptions};
use clusterterm_terminal::types::Dimensions;
use clusterterm_terminal::ConnectionState;
use common::*;

fn options(send: Option<&str>) -> SnapshotOptions {
    SnapshotOptions {
        send: send.map(str::to_string),
        wait: Duration::from_millis(300),
        size: Dimensions::new(24, 80).unwrap(),
        connect_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_snapshot_sizes_then_types() {
    let addr = serve(echo_shell()).await;
    let report = run_snapshot(&endpoint(addr), task("42"), options(Some("echo hi")))
        .await
        .unwrap();

    assert_eq!(report.state, ConnectionState::Open);
    assert!(report.succeeded());
    let lines: Vec<&str> = report.screen.lines().collect();
    assert_eq!(lines[0], "size 80x24");
    assert!(lines[1].starts_with("you typed: echo hi"), "screen: {:?}", report.screen);
}

#[tokio::test]
async fn test_abnormal_close_fails_session() {
    let (router, _answered) = exiting_shell(4000, "shell exited");
    let addr = serve(router).await;
    let report = run_snapshot(&endpoint(addr), task("42"), options(None))
        .await
        .unwrap();

    assert_eq!(report.state, ConnectionState::Failed);
    assert!(!report.succeeded());
    let error = report.error.unwrap();
    assert!(error.contains("4000"), "error: {}", error);
    assert!(report.screen.contains("[connection lost: code 4000: shell exited]"));
}

#[tokio::test]
async fn test_server_close_handshake_is_answered() {
    let (router, answered) = exiting_shell(4000, "shell exited");
    let addr = serve(router).await;
    run_snapshot(&endpoint(addr), task("42"), options(None))
        .await
        .unwrap();

    let answered = tokio::time::timeout(Duration::from_secs(2), answered)
        .await
        .expect("server saw the end of the connection")
        .unwrap();
    assert!(answered);
}

#[tokio::test]
async fn test_dropped_connection_reports_abnormal_closure() {
    let addr = serve(vanishing_shell()).await;
    let report = run_snapshot(&endpoint(addr), task("42"), options(None))
        .await
        .unwrap();

    assert_eq!(report.state, ConnectionState::Failed);
    let error = report.error.unwrap();
    assert!(error.contains("code 1006"), "error: {}", error);
    assert!(
        report.screen.contains("[connection lost: code 1006"),
        "screen: {:?}",
        report.screen
    );
    assert!(!report.screen.contains("[connection failed:"));
}

#[tokio::test]
async fn test_remote_error_is_shown_then_session_closes() {
    let addr = serve(failing_shell("no such task")).await;
    let report = run_snapshot(&endpoint(addr), task("missing"), options(None))
        .await
        .unwrap();

    assert_eq!(report.state, ConnectionState::Closed);
    assert_eq!(report.remote_error.as_deref(), Some("no such task"));
    assert!(report.screen.contains("[remote error: no such task]"));
    assert!(report.screen.contains("[session closed]"));
}

#[tokio::test]
async fn test_unreachable_server_fails_session() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let report = run_snapshot(&endpoint(addr), task("42"), options(Some("ls")))
        .await
        .unwrap();
    assert_eq!(report.state, ConnectionState::Failed);
    assert!(report.screen.contains("[connection failed:"));
}
