//! Subscription state machine.
//!
//! A subscription moves through
//! `Idle -> Connecting -> Streaming -> Success | Failure`. All changes
//! go through [`reduce`], which takes the current [`JobSnapshot`] and
//! one [`StreamEvent`] and reports what happened as a [`Transition`].
//! Nothing here touches a transport.

use resumeiq_core::job_phase::{CONNECTION_ERROR, JOB_FAILED};
use resumeiq_core::types::Percent;
use serde::Serialize;

use crate::messages::{parse_message, JobStatusMessage, Phase};

/// Lifecycle of one subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamState {
    /// No job id supplied; no connection exists.
    #[default]
    Idle,
    /// The transport is being opened.
    Connecting,
    /// Transport open, phase non-terminal.
    Streaming,
    Success,
    /// Failure phase reported by the backend, or a transport failure.
    Failure,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Last-known-good view of a job, as observed by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub state: StreamState,
    pub phase: Option<Phase>,
    pub progress: Percent,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
}

impl JobSnapshot {
    /// A fresh snapshot for a subscription whose transport is opening.
    pub fn connecting() -> Self {
        Self {
            state: StreamState::Connecting,
            ..Self::default()
        }
    }
}

/// Something that happened on a subscription's transport.
#[derive(Debug, Clone, Copy)]
pub enum StreamEvent<'a> {
    /// The transport finished opening.
    Opened,
    /// A text frame arrived.
    Frame(&'a str),
    /// The transport failed. The detail is for logs only.
    TransportError(&'a str),
    /// The server ended the stream.
    Closed,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Unchanged,
    Updated,
    /// A frame could not be parsed; its error was recorded.
    Invalid(String),
    /// The job just reached success. Carries the result for the
    /// completion callback.
    Completed(serde_json::Value),
}

impl Transition {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Apply one event to a snapshot.
///
/// Terminal states absorb every further event, so `result` is written at
/// most once and [`Transition::Completed`] is returned at most once per
/// subscription.
pub fn reduce(snapshot: &mut JobSnapshot, event: StreamEvent<'_>) -> Transition {
    if snapshot.state.is_terminal() || snapshot.state == StreamState::Idle {
        return Transition::Unchanged;
    }

    match event {
        StreamEvent::Opened => {
            if snapshot.state == StreamState::Connecting {
                snapshot.state = StreamState::Streaming;
                Transition::Updated
            } else {
                Transition::Unchanged
            }
        }
        StreamEvent::Frame(text) => match parse_message(text) {
            Ok(msg) => apply_message(snapshot, &msg),
            Err(e) => {
                snapshot.error = Some(format!("Failed to parse job status message: {e}"));
                Transition::Invalid(e.to_string())
            }
        },
        StreamEvent::TransportError(_) => {
            snapshot.state = StreamState::Failure;
            snapshot.error = Some(CONNECTION_ERROR.to_string());
            Transition::Updated
        }
        StreamEvent::Closed => Transition::Unchanged,
    }
}

/// Apply an already-parsed status message.
///
/// Shared by the stream and the REST status endpoint, which returns the
/// same message shape.
pub fn apply_message(snapshot: &mut JobSnapshot, msg: &JobStatusMessage) -> Transition {
    if snapshot.state.is_terminal() {
        return Transition::Unchanged;
    }

    let error = msg.error_text();
    let has_error = error.is_some();
    if let Some(error) = error {
        snapshot.error = Some(error);
    }

    let phase = msg.phase();
    if phase != Some(Phase::Success) {
        if let Some(progress) = msg.progress_percent() {
            snapshot.progress = progress;
        }
    }

    match phase {
        Some(Phase::Success) => {
            let result = msg.result.clone().unwrap_or(serde_json::Value::Null);
            snapshot.phase = Some(Phase::Success);
            snapshot.progress = 100;
            snapshot.result = Some(result.clone());
            snapshot.state = StreamState::Success;
            return Transition::Completed(result);
        }
        Some(Phase::Failure) => {
            if !has_error {
                snapshot.error = Some(JOB_FAILED.to_string());
            }
            snapshot.phase = Some(Phase::Failure);
            snapshot.state = StreamState::Failure;
        }
        Some(other) => {
            snapshot.phase = Some(other);
            snapshot.state = StreamState::Streaming;
        }
        None => {
            snapshot.state = StreamState::Streaming;
        }
    }

    Transition::Updated
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn streaming() -> JobSnapshot {
        let mut snapshot = JobSnapshot::connecting();
        reduce(&mut snapshot, StreamEvent::Opened);
        snapshot
    }

    #[test]
    fn default_snapshot_is_idle_and_neutral() {
        let snapshot = JobSnapshot::default();
        assert_eq!(snapshot.state, StreamState::Idle);
        assert!(snapshot.phase.is_none());
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.error.is_none());
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn idle_ignores_frames() {
        let mut snapshot = JobSnapshot::default();
        let t = reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"SUCCESS"}"#));
        assert_eq!(t, Transition::Unchanged);
        assert_eq!(snapshot, JobSnapshot::default());
    }

    #[test]
    fn opened_moves_connecting_to_streaming() {
        let mut snapshot = JobSnapshot::connecting();
        assert_eq!(reduce(&mut snapshot, StreamEvent::Opened), Transition::Updated);
        assert_eq!(snapshot.state, StreamState::Streaming);
        assert!(snapshot.phase.is_none());
        assert_eq!(snapshot.progress, 0);
    }

    #[test]
    fn happy_path_reaches_one_hundred() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":40}"#));
        assert_eq!(snapshot.progress, 40);
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":75}"#));
        assert_eq!(snapshot.progress, 75);
        let t = reduce(
            &mut snapshot,
            StreamEvent::Frame(r#"{"status":"SUCCESS","progress":80,"result":{"ats_score":88}}"#),
        );

        assert_matches!(t, Transition::Completed(ref r) if r == &json!({"ats_score": 88}));
        assert_eq!(snapshot.state, StreamState::Success);
        assert_eq!(snapshot.phase, Some(Phase::Success));
        assert_eq!(snapshot.progress, 100);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.result, Some(json!({"ats_score": 88})));
    }

    #[test]
    fn duplicate_success_keeps_first_result() {
        let mut snapshot = streaming();
        let first = reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"SUCCESS","result":"R1"}"#));
        let second = reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"SUCCESS","result":"R2"}"#));

        assert_matches!(first, Transition::Completed(_));
        assert_eq!(second, Transition::Unchanged);
        assert_eq!(snapshot.result, Some(json!("R1")));
    }

    #[test]
    fn success_without_result_completes_with_null() {
        let mut snapshot = streaming();
        let t = reduce(&mut snapshot, StreamEvent::Frame(r#"{"state":"SUCCESS"}"#));
        assert_eq!(t, Transition::Completed(serde_json::Value::Null));
        assert_eq!(snapshot.result, Some(serde_json::Value::Null));
    }

    #[test]
    fn malformed_frame_records_error_and_keeps_streaming() {
        let mut snapshot = streaming();
        let t = reduce(&mut snapshot, StreamEvent::Frame("{not json"));
        assert_matches!(t, Transition::Invalid(_));
        assert_eq!(snapshot.state, StreamState::Streaming);
        let recorded = snapshot.error.clone().unwrap();
        assert!(recorded.starts_with("Failed to parse job status message"));

        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":50}"#));
        assert_eq!(snapshot.phase, Some(Phase::Processing));
        assert_eq!(snapshot.progress, 50);
        assert_eq!(snapshot.error.as_deref(), Some(recorded.as_str()));
    }

    #[test]
    fn missing_progress_keeps_previous_value() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":60}"#));
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING"}"#));
        assert_eq!(snapshot.progress, 60);
    }

    #[test]
    fn progress_may_go_backwards() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":70}"#));
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":30}"#));
        assert_eq!(snapshot.progress, 30);
    }

    #[test]
    fn advisory_error_coexists_with_processing() {
        let mut snapshot = streaming();
        reduce(
            &mut snapshot,
            StreamEvent::Frame(r#"{"status":"PROCESSING","progress":20,"error":"OCR retrying"}"#),
        );
        assert_eq!(snapshot.state, StreamState::Streaming);
        assert_eq!(snapshot.error.as_deref(), Some("OCR retrying"));

        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":30}"#));
        assert_eq!(snapshot.error.as_deref(), Some("OCR retrying"));
    }

    #[test]
    fn failure_phase_is_terminal() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"state":"FAILURE","error":"bad file"}"#));
        assert_eq!(snapshot.state, StreamState::Failure);
        assert_eq!(snapshot.phase, Some(Phase::Failure));
        assert_eq!(snapshot.error.as_deref(), Some("bad file"));

        let t = reduce(&mut snapshot, StreamEvent::Frame(r#"{"state":"SUCCESS","result":1}"#));
        assert_eq!(t, Transition::Unchanged);
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn failure_without_error_gets_generic_message() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"FAILURE"}"#));
        assert_eq!(snapshot.error.as_deref(), Some(JOB_FAILED));
    }

    #[test]
    fn transport_error_is_distinct_from_server_error() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","error":"slow"}"#));
        reduce(&mut snapshot, StreamEvent::TransportError("connection reset"));
        assert_eq!(snapshot.state, StreamState::Failure);
        assert_eq!(snapshot.error.as_deref(), Some(CONNECTION_ERROR));
        assert_eq!(snapshot.phase, Some(Phase::Processing));
    }

    #[test]
    fn unknown_phase_is_observable_and_non_terminal() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"RETRY","progress":10}"#));
        assert_eq!(snapshot.phase, Some(Phase::Other("RETRY".into())));
        assert_eq!(snapshot.state, StreamState::Streaming);

        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":15}"#));
        assert_eq!(snapshot.phase, Some(Phase::Processing));
    }

    #[test]
    fn numeric_phase_passes_through_with_progress() {
        let mut snapshot = streaming();
        let t = reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":3,"progress":40}"#));
        assert_eq!(t, Transition::Updated);
        assert_eq!(snapshot.phase, Some(Phase::Other("3".into())));
        assert_eq!(snapshot.progress, 40);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.state, StreamState::Streaming);
    }

    #[test]
    fn message_without_phase_keeps_previous_phase() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":10}"#));
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"progress":12}"#));
        assert_eq!(snapshot.phase, Some(Phase::Processing));
        assert_eq!(snapshot.progress, 12);
    }

    #[test]
    fn server_close_does_not_change_snapshot() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROCESSING","progress":10}"#));
        let before = snapshot.clone();
        assert_eq!(reduce(&mut snapshot, StreamEvent::Closed), Transition::Unchanged);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn snapshot_serializes_to_caller_shape() {
        let mut snapshot = streaming();
        reduce(&mut snapshot, StreamEvent::Frame(r#"{"status":"PROGRESS","progress":5}"#));
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "state": "STREAMING",
                "phase": "PROCESSING",
                "progress": 5,
                "error": null,
                "result": null,
            })
        );
    }
}
