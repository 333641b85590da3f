//! # Stats aggregator: fan-in of snapshot notifications to one SSE channel.
//!
//! [`StatsAggregator`] subscribes a handler to every monitored source and
//! merges each incoming snapshot with the source's live identity fields into
//! one formatted record on the shared output channel. It never polls;
//! sources notify at their own cadence and all work happens inside those
//! notification dispatches.
//!
//! ## Architecture
//! ```text
//! Sources (each with a SnapshotHub):
//!   breaker "db-call"  ── emit(snapshot) ──► handler ─┐
//!   breaker "http-get" ── emit(snapshot) ──► handler ─┼─► StatsChannel ──► StatsStream ──► consumer
//!   breaker "cache"    ── emit(snapshot) ──► handler ─┘   (data: {...}\n\n per record)
//!
//! Each handler, per notification:
//!   1. channel still open?  no ──► unsubscribe self, drop snapshot
//!   2. merge {name, closed, group, options} ∪ snapshot  (snapshot wins)
//!   3. render `data: <JSON>\n\n`, write to the channel
//! ```
//!
//! ## Lifecycle
//! [`shutdown`](StatsAggregator::shutdown) terminates the channel but does
//! not walk the sources to unregister handlers. Cleanup is lazy: the next
//! notification from each source hits the dead-channel check and removes
//! that source's handler. Sources and the aggregator keep independent
//! lifecycles this way, with at most one wasted notification check per
//! source after shutdown.

use std::sync::Arc;

use crate::sources::{MonitoredSource, SourceRef};
use crate::stream::channel::{StatsChannel, StatsStream};
use crate::stream::record::OutputRecord;

/// Aggregates snapshot notifications from monitored sources onto one shared
/// server-sent-event channel.
///
/// Construction opens the channel; [`add`](Self::add) attaches further
/// sources at any point; [`stream`](Self::stream) hands the single shared
/// read handle to the transport layer; [`shutdown`](Self::shutdown) ends the
/// stream. None of these operations can fail.
#[derive(Debug)]
pub struct StatsAggregator {
    channel: Arc<StatsChannel>,
    stream: StatsStream,
}

impl StatsAggregator {
    /// Creates the aggregator and subscribes each of `sources`.
    ///
    /// The channel starts open and consumable; records emitted before the
    /// consumer begins reading are buffered by the underlying channel.
    #[must_use]
    pub fn new(sources: Vec<SourceRef>) -> Self {
        let (channel, stream) = StatsChannel::open();
        let aggregator = Self { channel, stream };
        for source in &sources {
            aggregator.add(source);
        }
        aggregator
    }

    /// Subscribes one more source to the shared channel.
    ///
    /// May be called at any time. Calling it after [`shutdown`](Self::shutdown)
    /// is discouraged but harmless: the first notification from such a
    /// source finds the dead channel and unregisters itself.
    pub fn add(&self, source: &SourceRef) {
        listen_for_snapshots(&self.channel, source);
        tracing::debug!(source = source.name(), "source subscribed to stats stream");
    }

    /// Returns the shared output stream.
    ///
    /// Idempotent: every call returns a handle onto the identical channel.
    #[must_use]
    pub fn stream(&self) -> StatsStream {
        self.stream.clone()
    }

    /// Terminates the output channel. Idempotent; never errors.
    ///
    /// Buffered records drain to the consumer, then the stream signals
    /// end-of-stream. Handlers still registered on sources clean themselves
    /// up lazily on their next notification.
    pub fn shutdown(&self) {
        tracing::debug!("stats stream shut down");
        self.channel.close();
    }
}

/// The subscribe procedure: registers the snapshot handler for one source.
///
/// The handler holds the source weakly. A subscription must not keep a
/// source alive, and the source owns the hub that owns this handler, so a
/// strong reference would form an unreclaimable cycle.
fn listen_for_snapshots(channel: &Arc<StatsChannel>, source: &SourceRef) {
    let channel = Arc::clone(channel);
    let weak = Arc::downgrade(source);
    source.snapshots().subscribe(move |id, snapshot| {
        let Some(source) = weak.upgrade() else {
            return;
        };
        // Re-checked on every notification: an unrelated shutdown() may
        // have closed the channel since the previous snapshot.
        if !channel.is_open() {
            source.snapshots().unsubscribe(id);
            tracing::debug!(
                source = source.name(),
                "output channel closed; snapshot listener removed"
            );
            return;
        }
        let record = OutputRecord::merge(source.as_ref(), snapshot);
        channel.write(record.to_sse_chunk());
    });
}
