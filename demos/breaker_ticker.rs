//! # Example: breaker_ticker
//!
//! One fake circuit breaker emits a metrics snapshot every 250ms; the main
//! task consumes the shared stream and prints each SSE chunk.
//!
//! Shows how to:
//! - Implement the [`MonitoredSource`] contract.
//! - Wire a source into [`StatsAggregator::new`].
//! - Consume chunks and end the stream with `shutdown()`.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► spawn ticker task: emit(snapshot) every 250ms
//!   └─► read 5 chunks from aggregator.stream()
//!         └─► aggregator.shutdown() ──► drain ──► end-of-stream
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example breaker_ticker
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use statstream::{MonitoredSource, SnapshotHub, SourceRef, StatsAggregator};

struct DemoBreaker {
    hub: SnapshotHub,
    successes: AtomicU64,
}

impl MonitoredSource for DemoBreaker {
    fn name(&self) -> &str {
        "db-call"
    }
    fn group(&self) -> &str {
        "default"
    }
    fn closed(&self) -> bool {
        true
    }
    fn options(&self) -> Map<String, Value> {
        json!({ "timeout": 500 }).as_object().cloned().unwrap_or_default()
    }
    fn snapshots(&self) -> &SnapshotHub {
        &self.hub
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt::init();

    let breaker = Arc::new(DemoBreaker {
        hub: SnapshotHub::new(),
        successes: AtomicU64::new(0),
    });
    let source: SourceRef = breaker.clone();
    let aggregator = StatsAggregator::new(vec![source]);

    // Snapshot timer: in a real deployment the breaker runtime drives this.
    let ticker = breaker.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(250)).await;
            let successes = ticker.successes.fetch_add(1, Ordering::SeqCst) + 1;
            let snapshot = json!({ "successes": successes, "failures": 0 });
            ticker.snapshots().emit(snapshot.as_object().expect("object"));
        }
    });

    let stream = aggregator.stream();
    for _ in 0..5 {
        match stream.next_chunk().await {
            Some(Ok(chunk)) => print!("{chunk}"),
            Some(Err(e)) => eprintln!("stream error: {e}"),
            None => break,
        }
    }

    aggregator.shutdown();
    while stream.next_chunk().await.is_some() {}
    println!("stream ended");
}
