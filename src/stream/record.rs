//! # Merged output record and SSE framing.
//!
//! An [`OutputRecord`] is the flattened record written to the output
//! channel: the source's identity fields merged with one snapshot payload.
//!
//! ## Merge order
//! The merge is explicit and order-sensitive. Identity fields (`name`,
//! `closed`, `group`, `options`) are inserted first, snapshot fields second,
//! so on a key collision the snapshot value wins. This invariant must not be
//! left to the incidental key ordering of a generic merge helper.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StreamError;
use crate::sources::{MonitoredSource, Snapshot};

/// Flattened record: `{name, closed, group, options}` merged with the
/// snapshot fields of one notification.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OutputRecord {
    fields: Map<String, Value>,
}

impl OutputRecord {
    /// Builds the record for one notification.
    ///
    /// Identity fields are read from the live source here, at notification
    /// time. Snapshot fields override identity fields on collision.
    pub fn merge(source: &dyn MonitoredSource, snapshot: &Snapshot) -> Self {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(source.name().to_owned()));
        fields.insert("closed".into(), Value::Bool(source.closed()));
        fields.insert("group".into(), Value::String(source.group().to_owned()));
        fields.insert("options".into(), Value::Object(source.options()));
        for (key, value) in snapshot {
            fields.insert(key.clone(), value.clone());
        }
        Self { fields }
    }

    /// Read access to the merged fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Renders the record as one server-sent-event text block:
    /// `data: <JSON object>\n\n`.
    ///
    /// The double newline terminator is mandatory; a single newline breaks
    /// downstream event-stream parsers.
    pub fn to_sse_chunk(&self) -> Result<String, StreamError> {
        let json = serde_json::to_string(&self.fields)?;
        Ok(format!("data: {json}\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::sources::SnapshotHub;

    struct StubSource {
        closed: bool,
        hub: SnapshotHub,
    }

    impl MonitoredSource for StubSource {
        fn name(&self) -> &str {
            "db-call"
        }
        fn group(&self) -> &str {
            "default"
        }
        fn closed(&self) -> bool {
            self.closed
        }
        fn options(&self) -> Map<String, Value> {
            json!({ "timeout": 500 }).as_object().expect("object").clone()
        }
        fn snapshots(&self) -> &SnapshotHub {
            &self.hub
        }
    }

    fn stub(closed: bool) -> StubSource {
        StubSource {
            closed,
            hub: SnapshotHub::new(),
        }
    }

    fn as_map(v: Value) -> Snapshot {
        v.as_object().expect("object").clone()
    }

    #[test]
    fn test_merge_carries_identity_and_snapshot() {
        let snapshot = as_map(json!({ "successes": 3, "failures": 0 }));
        let record = OutputRecord::merge(&stub(true), &snapshot);

        let expected = as_map(json!({
            "name": "db-call",
            "closed": true,
            "group": "default",
            "options": { "timeout": 500 },
            "successes": 3,
            "failures": 0,
        }));
        assert_eq!(*record.fields(), expected);
    }

    #[test]
    fn test_snapshot_fields_override_identity() {
        let snapshot = as_map(json!({ "closed": false, "name": "override" }));
        let record = OutputRecord::merge(&stub(true), &snapshot);

        assert_eq!(record.fields()["closed"], Value::Bool(false));
        assert_eq!(record.fields()["name"], json!("override"));
    }

    #[test]
    fn test_sse_chunk_framing_is_exact() {
        let snapshot = as_map(json!({ "successes": 3 }));
        let chunk = OutputRecord::merge(&stub(true), &snapshot)
            .to_sse_chunk()
            .expect("serializable");

        assert!(chunk.starts_with("data: {"));
        assert!(chunk.ends_with("}\n\n"));
        // Exactly one frame: the payload itself contains no newline.
        assert_eq!(chunk.matches('\n').count(), 2);

        let json_part = chunk
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .expect("framed");
        let parsed: Value = serde_json::from_str(json_part).expect("valid JSON");
        assert_eq!(parsed["successes"], json!(3));
    }
}
