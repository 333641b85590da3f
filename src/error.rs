//! Error types surfaced on the stats stream.
//!
//! The taxonomy is deliberately minimal. This component is a best-effort
//! telemetry sidecar: none of its operations raise a user-visible error.
//! A write against a dead channel is a silent no-op followed by lazy
//! unsubscription, and double shutdown is a no-op. The one failure that can
//! exist (a merged record that does not serialize) travels *through* the
//! output channel to the consumer as an `Err` item rather than being raised
//! at the write site, so a broken payload can never destabilize the
//! monitored system.

use thiserror::Error;

/// Errors delivered to the stream consumer as channel items.
///
/// Producers never observe these; the snapshot handler forwards them into
/// the channel where the single consumer decides how to react (typically by
/// tearing down the transport response).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StreamError {
    /// A merged metrics record could not be serialized to JSON.
    #[error("failed to serialize metrics record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StreamError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Serialize(_) => "record_serialize",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StreamError::Serialize(e) => format!("serialize failed: {e}"),
        }
    }
}
