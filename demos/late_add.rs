//! # Example: late_add
//!
//! Dynamically attach a second circuit breaker to an already-running stats
//! stream and watch both interleave on the same channel.
//!
//! Shows how to:
//! - Start the aggregator with an initial source set.
//! - Attach another source later with [`StatsAggregator::add`].
//! - Observe arrival-order interleaving across sources.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► StatsAggregator::new([db-call])
//!   ├─► spawn ticker for db-call
//!   ├─► after 1s: aggregator.add(http-get), spawn its ticker
//!   └─► read chunks for 3s ──► shutdown ──► drain ──► exit
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example late_add
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use statstream::{MonitoredSource, SnapshotHub, SourceRef, StatsAggregator};

struct DemoBreaker {
    name: &'static str,
    hub: SnapshotHub,
}

impl DemoBreaker {
    fn arc(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            hub: SnapshotHub::new(),
        })
    }
}

impl MonitoredSource for DemoBreaker {
    fn name(&self) -> &str {
        self.name
    }
    fn group(&self) -> &str {
        "default"
    }
    fn closed(&self) -> bool {
        true
    }
    fn options(&self) -> Map<String, Value> {
        Map::new()
    }
    fn snapshots(&self) -> &SnapshotHub {
        &self.hub
    }
}

fn spawn_ticker(breaker: Arc<DemoBreaker>, period: Duration) {
    tokio::spawn(async move {
        let mut n = 0u64;
        loop {
            tokio::time::sleep(period).await;
            n += 1;
            let snapshot = json!({ "successes": n, "failures": 0 });
            breaker.snapshots().emit(snapshot.as_object().expect("object"));
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt::init();

    let db = DemoBreaker::arc("db-call");
    let aggregator = Arc::new(StatsAggregator::new(vec![db.clone() as SourceRef]));
    spawn_ticker(db, Duration::from_millis(300));

    // Attach a second source once the stream is already flowing.
    let late_aggregator = Arc::clone(&aggregator);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let http = DemoBreaker::arc("http-get");
        late_aggregator.add(&(http.clone() as SourceRef));
        spawn_ticker(http, Duration::from_millis(200));
    });

    let stream = aggregator.stream();
    let reader = tokio::spawn(async move {
        while let Some(chunk) = stream.next_chunk().await {
            match chunk {
                Ok(text) => print!("{text}"),
                Err(e) => eprintln!("stream error: {e}"),
            }
        }
        println!("stream ended");
    });

    tokio::time::sleep(Duration::from_secs(3)).await;
    aggregator.shutdown();
    let _ = reader.await;
}
