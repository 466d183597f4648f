//! Correlation behaviour end to end: buffering, flush races, timeouts.

mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use chronicle::event::Level;
use chronicle::{LogEvent, Logger, Outcome, RequestContext, RequestMeta};
use common::Harness;

fn note(text: &str) -> LogEvent {
    LogEvent::new("note", Level::Info).with_message(text)
}

#[tokio::test(start_paused = true)]
async fn test_grouped_block_for_responded_request() {
    let harness = Harness::new(Duration::from_secs(60));
    let id = harness.correlator.begin_request(RequestMeta::new("GET", "/x"));
    let log = Logger::new(harness.correlator.clone()).bind(&RequestContext::new(id.clone()));

    log.info("db/call", json!({"name": "find", "args": ["x"]}));
    tokio::time::advance(Duration::from_millis(50)).await;
    assert!(harness.writer.entries().is_empty());

    assert!(harness.correlator.complete_request(&id, Outcome::responded(200)));

    assert_eq!(
        harness.writer.entries(),
        vec![(Level::Info, "GET 200 /x (50ms)\n  db/call find('x')".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_flushes_buffered_events() {
    let harness = Harness::new(Duration::from_secs(60));
    let id = harness.correlator.begin_request(RequestMeta::new("POST", "/slow"));
    harness.correlator.log(Some(&id), note("before timeout"));

    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(harness.correlator.is_pending(&id));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(common::eventually(|| !harness.correlator.is_pending(&id)).await);

    let entries = harness.writer.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, Level::Warn);
    assert_eq!(
        entries[0].1,
        "POST TIMEOUT /slow (60000ms)\n  note\n    before timeout"
    );

    // Late completion and late logging after the timeout.
    assert!(!harness.correlator.complete_request(&id, Outcome::responded(200)));
    harness.correlator.log(Some(&id), note("after timeout"));

    let entries = harness.writer.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].1, "note\n  after timeout");
}

#[tokio::test]
async fn test_events_flush_in_arrival_order() {
    let harness = Harness::new(Duration::from_secs(60));
    let id = harness.correlator.begin_request(RequestMeta::new("GET", "/ordered"));

    for n in 0..20 {
        harness.correlator.log(Some(&id), note(&format!("event {n}")));
    }
    harness
        .correlator
        .complete_request(&id, Outcome::responded(200).with_duration_ms(1));

    let text = &harness.writer.texts()[0];
    let logged: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("event "))
        .collect();
    let expected: Vec<String> = (0..20).map(|n| format!("event {n}")).collect();
    assert_eq!(logged, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_requests_keep_their_own_order() {
    const REQUESTS: usize = 8;
    const EVENTS: usize = 25;

    let harness = Harness::new(Duration::from_secs(60));
    let ids: Vec<_> = (0..REQUESTS)
        .map(|r| {
            harness
                .correlator
                .begin_request(RequestMeta::new("GET", format!("/mixed/{r}")))
        })
        .collect();

    let start = Arc::new(Barrier::new(REQUESTS));
    let mut tasks = Vec::new();
    for (r, id) in ids.iter().enumerate() {
        let correlator = harness.correlator.clone();
        let id = id.clone();
        let start = start.clone();
        tasks.push(tokio::spawn(async move {
            start.wait().await;
            for n in 0..EVENTS {
                correlator.log(Some(&id), note(&format!("req{r} event {n}")));
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for id in &ids {
        harness
            .correlator
            .complete_request(id, Outcome::responded(200).with_duration_ms(1));
    }

    let texts = harness.writer.texts();
    assert_eq!(texts.len(), REQUESTS);
    for r in 0..REQUESTS {
        let summary = format!("GET 200 /mixed/{r} (1ms)");
        let block = texts
            .iter()
            .find(|text| text.lines().next() == Some(summary.as_str()))
            .unwrap_or_else(|| panic!("no block for /mixed/{r}"));

        let logged: Vec<&str> = block
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("req"))
            .collect();
        let expected: Vec<String> = (0..EVENTS).map(|n| format!("req{r} event {n}")).collect();
        assert_eq!(logged, expected, "block for /mixed/{r}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completion_flushes_once() {
    let harness = Harness::new(Duration::from_millis(5));
    let mut ids = Vec::new();
    for n in 0..50 {
        let id = harness
            .correlator
            .begin_request(RequestMeta::new("GET", format!("/race/{n}")));
        harness.correlator.log(Some(&id), note("racing"));
        ids.push(id);
    }

    let mut tasks = Vec::new();
    for id in ids {
        for status in [200, 500] {
            let correlator = harness.correlator.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                correlator.complete_request(&id, Outcome::responded(status))
            }));
        }
    }

    let mut won = 0;
    for task in tasks {
        if task.await.unwrap() {
            won += 1;
        }
    }
    assert!(common::eventually(|| harness.correlator.pending_count() == 0).await);

    // Timeouts may win some races, but every request flushes exactly once.
    let texts = harness.writer.texts();
    let timed_out = texts.iter().filter(|text| text.contains(" TIMEOUT ")).count();
    assert_eq!(won + timed_out, 50);

    for n in 0..50 {
        let url = format!(" /race/{n} ");
        let matching = texts
            .iter()
            .filter(|text| text.lines().next().is_some_and(|line| line.contains(&url)))
            .count();
        assert_eq!(matching, 1, "request /race/{n} flushed {matching} times");
    }
}

#[tokio::test]
async fn test_stale_completion_is_noop() {
    let harness = Harness::new(Duration::from_secs(60));
    let id = harness.correlator.begin_request(RequestMeta::new("GET", "/once"));

    assert!(harness.correlator.complete_request(&id, Outcome::responded(204)));
    assert!(!harness.correlator.complete_request(&id, Outcome::responded(204)));
    assert_eq!(harness.writer.entries().len(), 1);
}

#[tokio::test]
async fn test_ids_are_unique() {
    let harness = Harness::new(Duration::from_secs(60));
    let first = harness.correlator.begin_request(RequestMeta::new("GET", "/a"));
    let second = harness.correlator.begin_request(RequestMeta::new("GET", "/a"));
    assert_ne!(first, second);
    assert_eq!(harness.correlator.pending_count(), 2);
}

#[tokio::test]
async fn test_block_persisted_as_one_record() {
    let harness = Harness::new(Duration::from_secs(60));
    let id = harness.correlator.begin_request(
        RequestMeta::new("get", "/persisted")
            .with_header("accept", "text/html")
            .with_header("accept", "application/json"),
    );
    harness.correlator.log(Some(&id), note("stored"));
    harness
        .correlator
        .complete_request(&id, Outcome::responded(201).with_duration_ms(7));
    harness.flush_sink().await;

    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    let body = &records[0].body;
    assert_eq!(body["type"], json!("server/request"));
    assert_eq!(body["request_id"], json!(id.as_str()));
    assert_eq!(body["method"], json!("GET"));
    assert_eq!(body["status_code"], json!(201));
    assert_eq!(body["duration_ms"], json!(7));
    assert_eq!(body["timed_out"], json!(false));
    assert_eq!(body["headers"]["accept"], json!("text/html, application/json"));
    assert_eq!(body["logs"][0]["message"], json!("stored"));
}
