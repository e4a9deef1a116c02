//! Export a finished analysis as a rewritten resume PDF.
//!
//! The analysis job's success payload is `{resume_id, ui, cached}`; it
//! carries no resume sections. The `resume_id` is sent to
//! `POST /resume/rewrite` and the `rewritten` sections of that response
//! are laid out with [`resumeiq_export`].

use chrono::NaiveDate;
use resumeiq_export::{build_resume_text, render_pdf, ContactInfo};
use serde_json::Value;

use crate::api::{JobsApi, JobsApiError};

/// What to rewrite for and whose name to print.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub target_role: String,
    pub candidate_level: String,
    pub contact: ContactInfo,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The analysis result does not identify a stored resume.
    #[error("Analysis result has no resume_id")]
    MissingResumeId,

    #[error(transparent)]
    Api(#[from] JobsApiError),
}

/// The stored resume id from an analysis success payload.
pub fn resume_id(analysis: &Value) -> Option<&str> {
    analysis
        .get("resume_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Rewrite the analysed resume and render the result as PDF bytes.
pub async fn rewrite_to_pdf(
    api: &JobsApi,
    analysis: &Value,
    options: &ExportOptions,
    generated_on: NaiveDate,
) -> Result<Vec<u8>, ExportError> {
    let resume_id = resume_id(analysis).ok_or(ExportError::MissingResumeId)?;

    let rewrite = api
        .rewrite_resume(resume_id, &options.target_role, &options.candidate_level)
        .await?;

    if rewrite.rewritten.get("fallback_used").and_then(Value::as_bool) == Some(true) {
        tracing::warn!(resume_id, "Backend used its fallback rewrite");
    }

    let text = build_resume_text(&rewrite.rewritten, &options.contact, generated_on);
    Ok(render_pdf(&text))
}
