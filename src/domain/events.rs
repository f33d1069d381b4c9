//! Events emitted by streaming recognition.
//!
//! A stream carries one [`RegionProgress`] per input region, in input
//! order, followed by exactly one [`StreamComplete`]. The wire shape
//! matches the JSON consumed by downstream transports:
//! `{"box_id": "...", "text": "...", "status": "done"}` for progress and
//! `{"status": "complete", "total": 3}` for the terminal event.

use serde::{Deserialize, Serialize};

/// Completion status of a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// The region produced text (possibly empty).
    Done,
    /// The region was skipped or its engine call failed.
    Error,
}

/// Per-region progress payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProgress {
    /// Id of the region this event reports on.
    pub box_id: String,
    /// Recognized text; empty on error.
    pub text: String,
    /// Outcome of the region.
    pub status: ProgressStatus,
    /// Failure reason when `status` is [`ProgressStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tag type pinning the terminal event's `status` field to `"complete"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompleteStatus {
    /// The only value.
    #[default]
    Complete,
}

/// Terminal event closing a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamComplete {
    /// Always `"complete"`.
    pub status: CompleteStatus,
    /// Number of input regions the stream covered.
    pub total: usize,
}

/// Tagged union of everything a recognition stream can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// One region finished (successfully or not).
    Progress(RegionProgress),
    /// The stream is over; no further events follow.
    Complete(StreamComplete),
}

impl StreamEvent {
    /// Builds a successful progress event.
    pub fn done(box_id: impl Into<String>, text: impl Into<String>) -> Self {
        StreamEvent::Progress(RegionProgress {
            box_id: box_id.into(),
            text: text.into(),
            status: ProgressStatus::Done,
            error: None,
        })
    }

    /// Builds a failed progress event carrying the failure reason.
    pub fn error(box_id: impl Into<String>, reason: impl Into<String>) -> Self {
        StreamEvent::Progress(RegionProgress {
            box_id: box_id.into(),
            text: String::new(),
            status: ProgressStatus::Error,
            error: Some(reason.into()),
        })
    }

    /// Builds the terminal completion event.
    pub fn complete(total: usize) -> Self {
        StreamEvent::Complete(StreamComplete {
            status: CompleteStatus::Complete,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_event_wire_shape() {
        let event = StreamEvent::done("abc", "hello");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["box_id"], "abc");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["status"], "done");
        assert!(json.get("error").is_none());

        let event = StreamEvent::error("abc", "invalid_box");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "invalid_box");
        assert_eq!(json["text"], "");
    }

    #[test]
    fn complete_event_wire_shape() {
        let event = StreamEvent::complete(3);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["total"], 3);
    }

    #[test]
    fn events_round_trip_through_untagged_repr() {
        let progress: StreamEvent =
            serde_json::from_str(r#"{"box_id":"a","text":"t","status":"done"}"#).unwrap();
        assert!(matches!(progress, StreamEvent::Progress(_)));

        let complete: StreamEvent =
            serde_json::from_str(r#"{"status":"complete","total":7}"#).unwrap();
        match complete {
            StreamEvent::Complete(c) => assert_eq!(c.total, 7),
            other => panic!("expected complete event, got {other:?}"),
        }
    }
}
