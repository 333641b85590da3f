//! # Monitored source contract.
//!
//! A monitored source is an external entity (typically a circuit breaker)
//! that periodically announces a metrics [`Snapshot`] on its
//! [`SnapshotHub`]. The aggregator never drives a source; it only reacts to
//! the notifications the source emits at its own cadence.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::sources::hub::SnapshotHub;

/// Point-in-time mapping of metric fields produced by a source.
///
/// Flat key/value data (counts, latencies, timestamps). A snapshot exists
/// only for the duration of one notification dispatch; handlers borrow it
/// and must not retain it.
pub type Snapshot = Map<String, Value>;

/// Shared handle to a monitored source.
pub type SourceRef = Arc<dyn MonitoredSource>;

/// Contract a source must satisfy to be aggregated.
///
/// Identity fields are read *fresh* at every notification, never cached at
/// subscribe time: `closed` in particular changes as the circuit transitions
/// between states, and the emitted record must reflect the state at emit
/// time.
///
/// ### Implementation requirements
/// - Field accessors must be cheap and non-blocking; they run inside the
///   notification dispatch path.
/// - The [`SnapshotHub`] returned by [`Self::snapshots`] must be owned by
///   the source and live as long as the source does.
pub trait MonitoredSource: Send + Sync + 'static {
    /// Logical name of the source (e.g. the command the breaker wraps).
    fn name(&self) -> &str;

    /// Grouping key for dashboard rollups.
    fn group(&self) -> &str;

    /// Current circuit state: `true` while the circuit is closed (healthy).
    fn closed(&self) -> bool;

    /// Configuration mapping of the source.
    ///
    /// Rebuilt on every call. No snapshot isolation is provided: if the
    /// underlying configuration is mutated concurrently with serialization,
    /// the record carries whatever this returns at notification time.
    fn options(&self) -> Map<String, Value>;

    /// The source's snapshot notification facility.
    fn snapshots(&self) -> &SnapshotHub;
}
