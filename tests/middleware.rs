//! Middleware tests against a real demo server.

mod common;

use serde_json::json;
use std::time::Duration;

use chronicle::config::ChronicleConfig;
use common::{eventually, start_demo_server, Harness};

#[tokio::test]
async fn test_one_block_per_request() {
    let harness = Harness::new(Duration::from_secs(60));
    let addr = start_demo_server(&harness, &ChronicleConfig::default()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Hello, world!");

    assert!(eventually(|| harness.writer.entries().len() == 1).await);
    let text = &harness.writer.texts()[0];
    assert!(text.starts_with("GET 200 / ("), "unexpected block: {text}");
    assert!(text.contains("\n  db/call findUser({ email: 'ada@example.com' })"));
    assert!(text.contains(
        "\n  db/update UPDATE users SET last_seen = '2024-01-01T00:00:00Z' WHERE id = 42"
    ));
    assert!(text.contains("\n  cache/get 'users' 42"));
    assert!(text.contains("\n  email/sent 'Welcome back' to 'ada@example.com'"));
    assert_eq!(harness.correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interleave() {
    let harness = Harness::new(Duration::from_secs(60));
    let addr = start_demo_server(&harness, &ChronicleConfig::default()).await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let client = client.clone();
        let url = format!("http://{}/", addr);
        handles.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    assert!(eventually(|| harness.writer.entries().len() == 10).await);
    for text in harness.writer.texts() {
        assert_eq!(text.matches("db/call").count(), 1);
        assert_eq!(text.matches("email/sent").count(), 1);
    }
}

#[tokio::test]
async fn test_reported_error_is_logged_and_reraised() {
    let harness = Harness::new(Duration::from_secs(60));
    let addr = start_demo_server(&harness, &ChronicleConfig::default()).await;

    let res = reqwest::get(format!("http://{}/whoa", addr)).await.unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "Whoa, something broke");

    assert!(eventually(|| harness.writer.entries().len() == 1).await);
    let text = &harness.writer.texts()[0];
    assert!(text.starts_with("GET 500 /whoa ("));
    assert!(text.contains("\n  note\n    About to fail"));
    assert!(text.contains("\n  server/error\n    Whoa, something broke"));

    harness.flush_sink().await;
    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    let logs = records[0].body["logs"].as_array().unwrap();
    assert_eq!(logs[1]["type"], json!("server/error"));
    assert_eq!(logs[1]["level"], json!("error"));
}

#[tokio::test]
async fn test_terminal_error_reporting_hides_details() {
    let harness = Harness::new(Duration::from_secs(60));
    let mut config = ChronicleConfig::default();
    config.errors.terminal = true;
    let addr = start_demo_server(&harness, &config).await;

    let res = reqwest::get(format!("http://{}/whoa", addr)).await.unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "");

    assert!(eventually(|| harness.writer.entries().len() == 1).await);
    assert!(harness.writer.texts()[0].contains("server/error"));
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    let harness = Harness::new(Duration::from_millis(100));
    let mut config = ChronicleConfig::default();
    config.server.request_timeout_secs = 1;
    let addr = start_demo_server(&harness, &config).await;

    let res = reqwest::get(format!("http://{}/timeout", addr)).await.unwrap();
    assert_eq!(res.status(), 408);

    // The late 408 completion must not produce a second block.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let entries = harness.writer.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].1.starts_with("GET TIMEOUT /timeout ("));
}
