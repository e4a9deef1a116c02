//! REST client for the resume analysis endpoints.
//!
//! Wraps job submission, status polling, result retrieval, resume
//! rewriting and job-description matching using [`reqwest`]. The job id
//! returned by [`JobsApi::analyze_resume`] is what
//! [`crate::manager::JobStreamClient`] subscribes to.

use resumeiq_core::error::CoreError;
use resumeiq_core::types::JobId;
use resumeiq_core::upload::validate_upload;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::messages::JobStatusMessage;

/// Default HTTP base URL of the analysis backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Candidate level sent with a rewrite when none is configured.
pub const DEFAULT_CANDIDATE_LEVEL: &str = "mid";

/// HTTP client for the analysis backend.
pub struct JobsApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

/// Response returned by `/resume/analyze-async` after queuing a job.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Identifier of the queued job; key of its status stream.
    pub task_id: JobId,
    /// History row created for this upload, if the backend reports one.
    #[serde(default)]
    pub history_id: Option<serde_json::Value>,
}

/// Body of `POST /resume/rewrite`.
#[derive(Debug, Serialize)]
pub struct RewriteRequest<'a> {
    pub resume_id: &'a str,
    pub target_role: &'a str,
    pub candidate_level: &'a str,
}

/// Rewritten resume content for a target role.
#[derive(Debug, Deserialize)]
pub struct RewriteResponse {
    pub resume_id: String,
    /// Role after backend normalization.
    #[serde(default)]
    pub target_role: Option<String>,
    /// Role as requested.
    #[serde(default)]
    pub original_role: Option<String>,
    /// `rewritten_summary`, `rewritten_experience`, `rewritten_projects`,
    /// `rewritten_skills` and friends.
    #[serde(default)]
    pub rewritten: serde_json::Value,
}

/// Body of `POST /jd/match`.
#[derive(Debug, Serialize)]
pub struct JdMatchRequest<'a> {
    pub resume_id: &'a str,
    pub job_description: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct JdMatchResponse {
    pub resume_id: String,
    /// Match score, matched/missing skills and suggestions, forwarded
    /// verbatim.
    #[serde(default)]
    pub match_analysis: serde_json::Value,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum JobsApiError {
    /// The request was rejected before anything was sent.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The configured base URL cannot address a resource.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl JobsApi {
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            token: None,
        }
    }

    /// Send `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Upload a resume for asynchronous analysis.
    ///
    /// Sends a multipart `POST /resume/analyze-async` with the file in
    /// the `file` field. The upload is validated locally first.
    pub async fn analyze_resume(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmitResponse, JobsApiError> {
        validate_upload(mime, bytes.len() as u64)?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorized(self.client.post(self.endpoint("/resume/analyze-async")))
            .multipart(form)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        tracing::info!(task_id = %submitted.task_id, file_name, "Resume submitted for analysis");
        Ok(submitted)
    }

    /// Poll the current status of a job.
    ///
    /// The endpoint returns the same message shape as the stream, so the
    /// result can be fed to [`crate::state::apply_message`].
    pub async fn get_status(&self, task_id: &str) -> Result<JobStatusMessage, JobsApiError> {
        let url = self.resource_url(&["resume", "status", task_id])?;
        let response = self.authorized(self.client.get(url)).send().await?;

        Self::parse_response(response).await
    }

    /// Fetch a stored analysis result by resume id.
    pub async fn get_result(&self, resume_id: &str) -> Result<serde_json::Value, JobsApiError> {
        let url = self.resource_url(&["resume", "result", resume_id])?;
        let response = self.authorized(self.client.get(url)).send().await?;

        Self::parse_response(response).await
    }

    /// Rewrite an analysed resume for `target_role` via
    /// `POST /resume/rewrite`.
    pub async fn rewrite_resume(
        &self,
        resume_id: &str,
        target_role: &str,
        candidate_level: &str,
    ) -> Result<RewriteResponse, JobsApiError> {
        require_non_empty("resume_id", resume_id)?;
        require_non_empty("target_role", target_role)?;

        let body = RewriteRequest {
            resume_id,
            target_role,
            candidate_level,
        };
        let response = self
            .authorized(self.client.post(self.endpoint("/resume/rewrite")))
            .json(&body)
            .send()
            .await?;

        let rewrite: RewriteResponse = Self::parse_response(response).await?;
        tracing::info!(
            resume_id,
            target_role = rewrite.target_role.as_deref().unwrap_or(target_role),
            "Resume rewritten",
        );
        Ok(rewrite)
    }

    /// Compare an analysed resume against a job description via
    /// `POST /jd/match`.
    pub async fn match_job_description(
        &self,
        resume_id: &str,
        job_description: &str,
    ) -> Result<JdMatchResponse, JobsApiError> {
        require_non_empty("resume_id", resume_id)?;
        require_non_empty("job_description", job_description)?;

        let body = JdMatchRequest {
            resume_id,
            job_description,
        };
        let response = self
            .authorized(self.client.post(self.endpoint("/jd/match")))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Build a URL under the base from path segments, percent-encoding
    /// each one.
    fn resource_url(&self, segments: &[&str]) -> Result<String, JobsApiError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| JobsApiError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| JobsApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Ensure the response has a success status code, or turn it into a
    /// [`JobsApiError::ApiError`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, JobsApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(JobsApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, JobsApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
