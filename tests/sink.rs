//! File sink persistence through the full pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chronicle::config::{ChronicleConfig, SinkConfig};
use chronicle::lifecycle;
use chronicle::output::MemoryWriter;
use chronicle::sink::{self, Record};
use chronicle::{Outcome, RequestMeta};

fn read_records(path: &Path) -> Vec<Record> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_records_written_as_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ChronicleConfig::default();
    config.output.color = false;
    config.output.root_path = Some(PathBuf::from("/srv/app"));
    config.sink = SinkConfig {
        enabled: true,
        path: Some(dir.path().to_path_buf()),
        collection: Some("requests".into()),
    };

    let components = lifecycle::build(&config, Arc::new(MemoryWriter::new()))
        .await
        .unwrap();
    let correlator = &components.correlator;
    let logger = chronicle::Logger::new(correlator.clone());

    logger
        .clone()
        .with_source("/srv/app/src/jobs.rs:3")
        .info("job/start", "nightly");
    let id = correlator.begin_request(RequestMeta::new("GET", "/stored"));
    correlator.complete_request(&id, Outcome::responded(200));
    correlator.begin_request(RequestMeta::new("GET", "/abandoned"));
    assert_eq!(lifecycle::finish(correlator).await, 1);

    let records = read_records(&dir.path().join("requests.jsonl"));
    assert_eq!(records.len(), 3);
    assert!(records.windows(2).all(|w| w[0].id < w[1].id));

    assert_eq!(records[0].body["type"], "job/start");
    assert_eq!(records[0].body["source"], "src/jobs.rs:3");
    assert_eq!(records[1].body["url"], "/stored");
    assert_eq!(records[2].body["outcome"], "aborted");
}

#[tokio::test]
async fn test_disabled_sink_connects_nothing() {
    let config = SinkConfig {
        enabled: false,
        path: Some(std::env::temp_dir()),
        collection: None,
    };
    assert!(sink::connect(&config).await.unwrap().is_none());
}

#[tokio::test]
async fn test_redirect_at_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ChronicleConfig::default();
    config.output.color = false;
    let components = lifecycle::build(&config, Arc::new(MemoryWriter::new()))
        .await
        .unwrap();
    let logger = chronicle::Logger::new(components.correlator.clone());

    logger.info("note", "console only");
    let file = sink::JsonLinesSink::open(dir.path(), None).await.unwrap();
    let path = file.path().to_path_buf();
    components.dispatcher.redirect(Some(Arc::new(file))).unwrap();
    logger.info("note", "persisted");
    components.dispatcher.flush_sink().await;

    let records = read_records(&path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].body["message"], "persisted");
    assert!(path.ends_with("chronicle.jsonl"));
}
