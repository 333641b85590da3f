//! # Shared output channel.
//!
//! The single ordered sink every subscribed source writes into, and the one
//! handle the transport consumer reads from.
//!
//! ## Architecture
//! ```text
//! Writers (many handlers):                    Consumer (one):
//!   handler A ──┐
//!   handler B ──┼──► StatsChannel ── mpsc ──► StatsStream ──► transport
//!   handler N ──┘    (Mutex<Option<Sender>>)   (shared receiver)
//! ```
//!
//! ## Rules
//! - **Arrival order**: chunks are delivered exactly as writes arrive; there
//!   is no cross-source fairness beyond first-come-first-served.
//! - **Close is terminal and idempotent**: [`StatsChannel::close`] drops the
//!   sender once; chunks already buffered drain to the consumer, then the
//!   stream signals end-of-stream exactly once.
//! - **Dead-sink detection**: the channel reports "not open" both after
//!   `close()` and after the consumer side has gone away, so writers can
//!   lazily tear down their subscriptions.
//! - **Write serialization**: sender access is serialized behind a mutex.
//!   The underlying design assumes cooperative single-threaded dispatch;
//!   this is the serialization primitive a multi-threaded port must add.
//!
//! Buffering is unbounded: a record accepted while the channel is open is
//! never dropped, and backpressure beyond what the primitive provides is a
//! non-goal.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::StreamError;

/// One rendered SSE chunk, or the serialization error that replaced it.
pub type ChunkResult = Result<String, StreamError>;

/// Write side of the shared output channel.
///
/// Held by the aggregator and by every snapshot handler. All writers share
/// one sender; taking it out on `close()` is what lets the receiver observe
/// end-of-stream even while handler closures stay registered.
#[derive(Debug)]
pub(crate) struct StatsChannel {
    tx: Mutex<Option<UnboundedSender<ChunkResult>>>,
}

impl StatsChannel {
    /// Creates the channel in the open state and returns both sides.
    pub(crate) fn open() -> (Arc<Self>, StatsStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
        });
        (channel, StatsStream::new(rx))
    }

    /// Health check performed by writers before every write.
    ///
    /// `false` once [`close`](Self::close) ran or the consumer dropped every
    /// read handle. Health can change between any two notifications, so this
    /// must be re-checked per notification, never cached.
    pub(crate) fn is_open(&self) -> bool {
        match &*self.lock() {
            Some(tx) => !tx.is_closed(),
            None => false,
        }
    }

    /// Appends one chunk in arrival order.
    ///
    /// Writing to a closed channel is a silent no-op; the next notification
    /// cleans up the writer through the liveness check.
    pub(crate) fn write(&self, chunk: ChunkResult) {
        if let Some(tx) = &*self.lock() {
            let _ = tx.send(chunk);
        }
    }

    /// Terminates the channel. Idempotent.
    pub(crate) fn close(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<UnboundedSender<ChunkResult>>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read handle over the shared output channel.
///
/// Cloning is cheap and every clone observes the *same* channel; repeated
/// [`StatsAggregator::stream`](crate::StatsAggregator::stream) calls hand
/// out clones of one handle. Exactly one consumer is expected to read at a
/// time (the stream feeds a single transport response).
///
/// Consume it either as a [`futures::Stream`] or directly via
/// [`next_chunk`](Self::next_chunk).
#[derive(Debug, Clone)]
pub struct StatsStream {
    rx: Arc<tokio::sync::Mutex<UnboundedReceiver<ChunkResult>>>,
}

impl StatsStream {
    fn new(rx: UnboundedReceiver<ChunkResult>) -> Self {
        Self {
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    /// Receives the next chunk, or `None` once the channel has terminated
    /// and all buffered chunks have drained.
    pub async fn next_chunk(&self) -> Option<ChunkResult> {
        self.rx.lock().await.recv().await
    }

    /// Whether two handles read from the identical underlying channel.
    pub fn same_channel(&self, other: &StatsStream) -> bool {
        Arc::ptr_eq(&self.rx, &other.rx)
    }
}

impl Stream for StatsStream {
    type Item = ChunkResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.try_lock() {
            Ok(mut rx) => rx.poll_recv(cx),
            // Contended only when a second consumer polls concurrently,
            // which violates the single-reader contract; reschedule rather
            // than lose the wakeup.
            Err(_) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunks_arrive_in_write_order() {
        let (channel, stream) = StatsChannel::open();

        channel.write(Ok("first".into()));
        channel.write(Ok("second".into()));

        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), "first");
        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), "second");
    }

    #[tokio::test]
    async fn test_close_drains_buffered_chunks_then_ends() {
        let (channel, stream) = StatsChannel::open();

        channel.write(Ok("buffered".into()));
        channel.close();

        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), "buffered");
        assert!(stream.next_chunk().await.is_none());
        // End-of-stream is sticky.
        assert!(stream.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (channel, stream) = StatsChannel::open();
        channel.close();
        channel.close();

        assert!(!channel.is_open());
        assert!(stream.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_write_after_close_is_silent_noop() {
        let (channel, stream) = StatsChannel::open();
        channel.close();
        channel.write(Ok("lost".into()));

        assert!(stream.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_consumer_drop_marks_channel_dead() {
        let (channel, stream) = StatsChannel::open();
        assert!(channel.is_open());

        drop(stream);
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_clones_share_the_channel() {
        let (channel, stream) = StatsChannel::open();
        let other = stream.clone();
        assert!(stream.same_channel(&other));

        channel.write(Ok("shared".into()));
        assert_eq!(other.next_chunk().await.unwrap().unwrap(), "shared");
        channel.close();
    }
}
