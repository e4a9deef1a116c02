//! Job status message types and parser.
//!
//! The analysis backend pushes JSON objects over the job stream with
//! the shape `{"status"|"state": "<phase>", "progress"?: n, "result"?: .., "error"?: ".."}`.
//! This module deserializes them into [`JobStatusMessage`] and
//! normalizes the phase into a [`Phase`].

use std::fmt;

use resumeiq_core::job_phase::{
    PHASE_FAILURE, PHASE_PROCESSING, PHASE_QUEUED, PHASE_SUCCESS, SYNONYM_PENDING,
    SYNONYM_PROGRESS, SYNONYM_STARTED,
};
use resumeiq_core::types::Percent;
use serde::{Deserialize, Serialize, Serializer};

/// Coarse lifecycle stage of a backend job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Queued,
    Processing,
    Success,
    Failure,
    /// A phase name the client does not know. Kept verbatim and treated
    /// as non-terminal.
    Other(String),
}

impl Phase {
    /// Normalize a phase name received from the backend.
    ///
    /// Matching is exact and case-sensitive. Celery's native state names
    /// map onto the canonical phases; anything else is passed through.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            PHASE_QUEUED | SYNONYM_PENDING => Self::Queued,
            PHASE_PROCESSING | SYNONYM_PROGRESS | SYNONYM_STARTED => Self::Processing,
            PHASE_SUCCESS => Self::Success,
            PHASE_FAILURE => Self::Failure,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => PHASE_QUEUED,
            Self::Processing => PHASE_PROCESSING,
            Self::Success => PHASE_SUCCESS,
            Self::Failure => PHASE_FAILURE,
            Self::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One status event pushed by the backend.
///
/// Every field is optional on the wire. Keys the client does not use
/// (`message`, `step`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatusMessage {
    /// Phase name. Kept loose so a non-string phase is passed through
    /// as [`Phase::Other`] instead of rejecting the message.
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub state: Option<serde_json::Value>,
    /// Kept loose so a non-numeric value is ignored instead of
    /// rejecting the whole message.
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    /// Opaque payload, forwarded verbatim. JSON `null` reads as absent.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl JobStatusMessage {
    /// The normalized phase, reading `status` first and falling back
    /// to `state`. `null` and empty strings count as absent; other
    /// non-string values become [`Phase::Other`] with their JSON text.
    pub fn phase(&self) -> Option<Phase> {
        wire_phase(self.status.as_ref()).or_else(|| wire_phase(self.state.as_ref()))
    }

    /// The reported progress rounded and clamped to `0..=100`, or `None`
    /// when the field is missing or not a number.
    pub fn progress_percent(&self) -> Option<Percent> {
        let value = self.progress.as_ref()?.as_f64()?;
        Some(value.round().clamp(0.0, 100.0) as Percent)
    }

    /// Human-readable error text, if the message carries one.
    ///
    /// Non-string errors are rendered as compact JSON. `null` and the
    /// empty string count as absent.
    pub fn error_text(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn wire_phase(value: Option<&serde_json::Value>) -> Option<Phase> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(Phase::from_wire(s)),
        other => Some(Phase::Other(other.to_string())),
    }
}

/// Parse a job stream text frame into a [`JobStatusMessage`].
///
/// Returns `Err` for malformed JSON or a non-object payload.
pub fn parse_message(text: &str) -> Result<JobStatusMessage, serde_json::Error> {
    serde_json::from_str(text)
}
