//! Job phase names sent by the analysis backend.
//!
//! The canonical four phases are matched case-sensitively. The backend
//! is Celery-driven and also emits its native state names, which are
//! listed here as synonyms.

pub const PHASE_QUEUED: &str = "QUEUED";
pub const PHASE_PROCESSING: &str = "PROCESSING";
pub const PHASE_SUCCESS: &str = "SUCCESS";
pub const PHASE_FAILURE: &str = "FAILURE";

/// Celery's name for a task that has not been picked up yet.
pub const SYNONYM_PENDING: &str = "PENDING";
/// Emitted by tasks that report intermediate progress.
pub const SYNONYM_PROGRESS: &str = "PROGRESS";
/// Emitted when task tracking of the start event is enabled.
pub const SYNONYM_STARTED: &str = "STARTED";

/// Error text recorded when the transport itself fails.
pub const CONNECTION_ERROR: &str = "Connection error";

/// Error text recorded for a failure phase that carries no message.
pub const JOB_FAILED: &str = "Job failed";
