//! The panic hook is process-wide, so this file holds a single test.

mod common;

use std::time::Duration;

use chronicle::crash;
use chronicle::event::Level;
use common::Harness;

#[tokio::test]
async fn test_first_panic_is_captured_once() {
    let harness = Harness::new(Duration::from_secs(60));
    crash::install(harness.dispatcher().clone());

    for message in ["first failure", "second failure"] {
        let result = std::thread::Builder::new()
            .name("worker".into())
            .spawn(move || panic!("{}", message))
            .unwrap()
            .join();
        assert!(result.is_err());
    }

    let entries = harness.writer.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, Level::Error);
    assert!(entries[0].1.starts_with("process/crash\n  thread 'worker' panicked at "));
    assert!(entries[0].1.ends_with("\n  first failure"));

    harness.flush_sink().await;
    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].body["type"], serde_json::json!("process/crash"));
}
