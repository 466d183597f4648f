//! Newline-delimited JSON file sink.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::sink::{Record, Sink, SinkError};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "chronicle";

/// Appends one JSON object per line to `{dir}/{collection}.jsonl`.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open (creating if needed) the collection file under `dir`.
    pub async fn open(dir: impl AsRef<Path>, collection: Option<&str>) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let path = dir.join(format!("{}.jsonl", collection.unwrap_or(DEFAULT_COLLECTION)));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tracing::info!(path = ?path, "Persisting log records");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonLinesSink {
    async fn persist(&self, record: &Record) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
