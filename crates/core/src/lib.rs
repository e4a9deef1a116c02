//! Shared building blocks for the ResumeIQ client crates.
//!
//! Holds the identifier aliases, the common [`error::CoreError`] type,
//! the job phase names spoken by the analysis backend, and upload
//! validation rules.

pub mod error;
pub mod job_phase;
pub mod types;
pub mod upload;
