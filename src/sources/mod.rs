//! Monitored sources: contract and notification facility.
//!
//! ## Contents
//! - [`MonitoredSource`], [`Snapshot`], [`SourceRef`] the source contract
//! - [`SnapshotHub`], [`SubscriptionId`] observer registry for snapshot events
//!
//! Sources are owned by the surrounding circuit-breaker runtime; this crate
//! holds at most a weak reference per subscription (see `stream::aggregator`).

mod hub;
mod source;

pub use hub::{SnapshotHub, SubscriptionId};
pub use source::{MonitoredSource, Snapshot, SourceRef};
