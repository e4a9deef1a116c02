use std::path::PathBuf;
use std::time::Duration;

use resumeiq_core::error::CoreError;

use crate::api::{DEFAULT_API_URL, DEFAULT_CANDIDATE_LEVEL};
use crate::client::DEFAULT_WS_URL;

/// Configuration for the `resumeiq-watch` binary, loaded from
/// environment variables.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// WebSocket base URL of the job stream endpoint.
    pub ws_url: String,
    /// HTTP base URL of the analysis backend.
    pub api_url: String,
    /// Bearer token for the REST endpoints.
    pub api_token: Option<String>,
    /// Job to watch. Ignored when `resume_file` is set.
    pub job_id: Option<String>,
    /// Resume to upload; the returned job id is watched.
    pub resume_file: Option<PathBuf>,
    /// Where to write the rewritten resume as a PDF.
    pub export_pdf: Option<PathBuf>,
    /// Name printed in the exported resume header.
    pub export_user_name: String,
    /// Role the exported resume is rewritten for. Required with
    /// `export_pdf`.
    pub export_target_role: Option<String>,
    /// Seniority sent with the rewrite request.
    pub export_candidate_level: String,
    /// Give up waiting for a terminal phase after this long.
    pub watch_timeout: Option<Duration>,
}

impl WatchConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default                                 |
    /// |----------------------|-----------------------------------------|
    /// | `JOB_WS_URL`         | `ws://localhost:8000/realtime/ws/task`  |
    /// | `JOB_API_URL`        | `http://localhost:8000`                 |
    /// | `JOB_API_TOKEN`      | --                                      |
    /// | `JOB_ID`             | --                                      |
    /// | `RESUME_FILE`        | --                                      |
    /// | `EXPORT_PDF`         | --                                      |
    /// | `EXPORT_USER_NAME`   | `User`                                  |
    /// | `EXPORT_TARGET_ROLE` | -- (required with `EXPORT_PDF`)         |
    /// | `EXPORT_CANDIDATE_LEVEL` | `mid`                               |
    /// | `WATCH_TIMEOUT_SECS` | -- (wait forever)                       |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let watch_timeout = match get("WATCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    CoreError::Config(format!("WATCH_TIMEOUT_SECS must be a valid u64, got {raw:?}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let config = Self {
            ws_url: get("JOB_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.into()),
            api_url: get("JOB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            api_token: get("JOB_API_TOKEN"),
            job_id: get("JOB_ID"),
            resume_file: get("RESUME_FILE").map(PathBuf::from),
            export_pdf: get("EXPORT_PDF").map(PathBuf::from),
            export_user_name: get("EXPORT_USER_NAME").unwrap_or_else(|| "User".into()),
            export_target_role: get("EXPORT_TARGET_ROLE"),
            export_candidate_level: get("EXPORT_CANDIDATE_LEVEL")
                .unwrap_or_else(|| DEFAULT_CANDIDATE_LEVEL.into()),
            watch_timeout,
        };

        if config.job_id.is_none() && config.resume_file.is_none() {
            return Err(CoreError::Config(
                "either JOB_ID or RESUME_FILE must be set".into(),
            ));
        }

        if config.export_pdf.is_some() && config.export_target_role.is_none() {
            return Err(CoreError::Config(
                "EXPORT_TARGET_ROLE must be set when EXPORT_PDF is set".into(),
            ));
        }

        Ok(config)
    }
}
