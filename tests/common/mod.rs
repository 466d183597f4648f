//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use chronicle::config::{ChronicleConfig, OutputConfig};
use chronicle::http::{demo_router, AppState};
use chronicle::output::{Dispatcher, MemoryWriter};
use chronicle::sink::MemorySink;
use chronicle::Correlator;

/// A correlator writing uncolored text to memory and records to a memory sink.
pub struct Harness {
    pub correlator: Correlator,
    pub writer: MemoryWriter,
    pub sink: MemorySink,
}

impl Harness {
    pub fn new(timeout: Duration) -> Self {
        let writer = MemoryWriter::new();
        let config = OutputConfig {
            color: false,
            ..OutputConfig::default()
        };
        let dispatcher = Dispatcher::new(&config, Arc::new(writer.clone()));
        let sink = MemorySink::new();
        dispatcher
            .redirect(Some(Arc::new(sink.clone())))
            .expect("runtime available");

        Self {
            correlator: Correlator::with_timeout(dispatcher, timeout),
            writer,
            sink,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.correlator.dispatcher()
    }

    pub async fn flush_sink(&self) {
        self.dispatcher().flush_sink().await;
    }
}

/// Serve the demo router for `harness` on an ephemeral port.
pub async fn start_demo_server(harness: &Harness, config: &ChronicleConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = demo_router(AppState::new(harness.correlator.clone()), config);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
