//! # statstream
//!
//! **Statstream** bridges circuit-breaker metrics snapshots to an external
//! monitoring consumer as a server-sent-event text stream.
//!
//! It is a formatting adapter, not a systems engine: the surrounding
//! circuit-breaker runtime (failure counting, open/half-open/closed
//! transitions, snapshot timers) stays outside this crate and participates
//! only through the [`MonitoredSource`] contract. Statstream subscribes to
//! each source's snapshot notifications, merges source identity with the
//! snapshot payload, and appends one `data: <JSON>\n\n` chunk per snapshot
//! to a single shared output channel.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   breaker 1  │   │   breaker 2  │   │   breaker N  │
//!     │ (SnapshotHub)│   │ (SnapshotHub)│   │ (SnapshotHub)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ emit(snapshot)   │                  │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  StatsAggregator                                          │
//! │  - one handler per subscribed source                      │
//! │  - per-notification liveness check (lazy unsubscription)  │
//! │  - OutputRecord merge: identity ∪ snapshot (snapshot wins)│
//! └────────────────────────────┬──────────────────────────────┘
//!                              ▼
//!                     StatsChannel (ordered, close-once)
//!                              │
//!                              ▼
//!                  StatsStream ──► transport response
//!                  (`data: {...}\n\n` per record)
//! ```
//!
//! ## Lifecycle
//! ```text
//! StatsAggregator::new(sources)     channel opens, every source subscribed
//!   ├─► add(source)                 late sources join the same channel
//!   ├─► stream()                    shared read handle (idempotent)
//!   └─► shutdown()                  channel ends exactly once
//!         └─► each source's next emit(): dead-channel check
//!               └─► handler unsubscribes itself (lazy cleanup)
//! ```
//!
//! ## Features
//! | Area           | Description                                          | Key types / traits                  |
//! |----------------|------------------------------------------------------|-------------------------------------|
//! | **Sources**    | Contract for monitored circuit breakers.             | [`MonitoredSource`], [`SourceRef`]  |
//! | **Notification**| Observer registry for snapshot events.              | [`SnapshotHub`], [`SubscriptionId`] |
//! | **Records**    | Order-sensitive identity/snapshot merge, SSE framing.| [`OutputRecord`]                    |
//! | **Streaming**  | Shared ordered channel with idempotent shutdown.     | [`StatsAggregator`], [`StatsStream`]|
//! | **Errors**     | Channel-level serialization failures.                | [`StreamError`]                     |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::{json, Map, Value};
//! use statstream::{MonitoredSource, SnapshotHub, SourceRef, StatsAggregator};
//!
//! struct Breaker {
//!     hub: SnapshotHub,
//! }
//!
//! impl MonitoredSource for Breaker {
//!     fn name(&self) -> &str { "db-call" }
//!     fn group(&self) -> &str { "default" }
//!     fn closed(&self) -> bool { true }
//!     fn options(&self) -> Map<String, Value> { Map::new() }
//!     fn snapshots(&self) -> &SnapshotHub { &self.hub }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let breaker = Arc::new(Breaker { hub: SnapshotHub::new() });
//!     let source: SourceRef = breaker.clone();
//!     let aggregator = StatsAggregator::new(vec![source]);
//!
//!     let snapshot = json!({ "successes": 3, "failures": 0 });
//!     breaker.snapshots().emit(snapshot.as_object().unwrap());
//!
//!     let stream = aggregator.stream();
//!     let chunk = stream.next_chunk().await.unwrap().unwrap();
//!     assert!(chunk.starts_with("data: ") && chunk.ends_with("\n\n"));
//!
//!     aggregator.shutdown();
//!     assert!(stream.next_chunk().await.is_none());
//! }
//! ```

mod error;
mod sources;
mod stream;

// ---- Public re-exports ----

pub use error::StreamError;
pub use sources::{MonitoredSource, Snapshot, SnapshotHub, SourceRef, SubscriptionId};
pub use stream::{ChunkResult, OutputRecord, StatsAggregator, StatsStream};
