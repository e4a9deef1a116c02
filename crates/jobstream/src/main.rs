//! `resumeiq-watch` -- follow a resume analysis job from the terminal.
//!
//! Optionally uploads a resume, subscribes to the job's status stream,
//! logs every change until the job finishes, prints the final snapshot
//! as JSON, and can rewrite the analysed resume for a target role and
//! export it as a PDF.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default                                | Description                        |
//! |----------------------|----------|----------------------------------------|------------------------------------|
//! | `JOB_ID`             | one of   | --                                     | Job to watch                       |
//! | `RESUME_FILE`        | one of   | --                                     | Resume to upload, then watch       |
//! | `JOB_WS_URL`         | no       | `ws://localhost:8000/realtime/ws/task` | Stream endpoint base               |
//! | `JOB_API_URL`        | no       | `http://localhost:8000`                | REST endpoint base                 |
//! | `JOB_API_TOKEN`      | no       | --                                     | Bearer token for REST calls        |
//! | `EXPORT_PDF`         | no       | --                                     | PDF file or directory to write to  |
//! | `EXPORT_USER_NAME`   | no       | `User`                                 | Name for the exported resume       |
//! | `EXPORT_TARGET_ROLE` | with PDF | --                                     | Role the resume is rewritten for   |
//! | `EXPORT_CANDIDATE_LEVEL` | no   | `mid`                                  | Seniority sent with the rewrite    |
//! | `WATCH_TIMEOUT_SECS` | no       | --                                     | Stop waiting after this many secs  |

use std::path::Path;

use resumeiq_core::upload::mime_for_file_name;
use resumeiq_export::{export_file_name, ContactInfo};
use resumeiq_jobstream::api::JobsApi;
use resumeiq_jobstream::config::WatchConfig;
use resumeiq_jobstream::rewrite_export::{rewrite_to_pdf, ExportOptions};
use resumeiq_jobstream::{JobSnapshot, JobStreamClient, StreamState, WsConnector};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resumeiq_jobstream=info,resumeiq_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WatchConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let job_id = match &config.resume_file {
        Some(path) => submit_resume(&config, path).await,
        None => config.job_id.clone().unwrap_or_default(),
    };

    tracing::info!(job_id = %job_id, ws_url = %config.ws_url, "Starting resumeiq-watch");

    let mut client = JobStreamClient::new(WsConnector::new(config.ws_url.clone()));
    client
        .subscribe(
            job_id.clone(),
            Some(Box::new(|_result| {
                tracing::info!("Analysis result received");
            })),
        )
        .await;

    let mut rx = client.watch();
    let finished = match config.watch_timeout {
        Some(limit) => tokio::time::timeout(limit, wait_for_terminal(&mut rx))
            .await
            .is_ok(),
        None => {
            wait_for_terminal(&mut rx).await;
            true
        }
    };
    if !finished {
        tracing::warn!(job_id = %job_id, "Timed out waiting for the job to finish");
    }

    let snapshot = client.snapshot();
    client.unsubscribe().await;

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialise snapshot"),
    }

    if let (Some(path), StreamState::Success) = (&config.export_pdf, snapshot.state) {
        export_pdf(&config, &snapshot, path).await;
    }

    if snapshot.state != StreamState::Success {
        std::process::exit(1);
    }
}

/// Upload the configured resume and return the job id to watch.
async fn submit_resume(config: &WatchConfig, path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".into());

    let Some(mime) = mime_for_file_name(&file_name) else {
        tracing::error!(file = %path.display(), "RESUME_FILE must be a .pdf, .doc or .docx file");
        std::process::exit(1);
    };

    let bytes = tokio::fs::read(path).await.unwrap_or_else(|e| {
        tracing::error!(file = %path.display(), error = %e, "Failed to read RESUME_FILE");
        std::process::exit(1);
    });

    let api = jobs_api(config);
    match api.analyze_resume(&file_name, mime, bytes).await {
        Ok(submitted) => submitted.task_id,
        Err(e) => {
            tracing::error!(error = %e, "Resume upload failed");
            std::process::exit(1);
        }
    }
}

/// Log each snapshot change until the subscription reaches a terminal
/// state.
async fn wait_for_terminal(rx: &mut watch::Receiver<JobSnapshot>) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        tracing::info!(
            state = ?snapshot.state,
            phase = snapshot.phase.as_ref().map(|p| p.as_str()).unwrap_or("-"),
            progress = snapshot.progress,
            error = snapshot.error.as_deref().unwrap_or(""),
            "Job status",
        );
        if snapshot.state.is_terminal() || snapshot.state == StreamState::Idle {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn jobs_api(config: &WatchConfig) -> JobsApi {
    let api = JobsApi::new(config.api_url.clone());
    match &config.api_token {
        Some(token) => api.with_token(token.clone()),
        None => api,
    }
}

/// Rewrite the analysed resume for the configured role and write it as
/// a PDF.
async fn export_pdf(config: &WatchConfig, snapshot: &JobSnapshot, path: &Path) {
    let Some(analysis) = snapshot.result.as_ref() else {
        return;
    };
    let Some(target_role) = config.export_target_role.clone() else {
        return;
    };

    let options = ExportOptions {
        target_role,
        candidate_level: config.export_candidate_level.clone(),
        contact: ContactInfo::new(config.export_user_name.clone()),
    };
    let bytes = match rewrite_to_pdf(
        &jobs_api(config),
        analysis,
        &options,
        chrono::Local::now().date_naive(),
    )
    .await
    {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Resume rewrite failed, no PDF written");
            return;
        }
    };

    let path = if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        path.join(export_file_name(&config.export_user_name, "pdf"))
    } else {
        path.to_path_buf()
    };

    match tokio::fs::write(&path, &bytes).await {
        Ok(()) => tracing::info!(file = %path.display(), bytes = bytes.len(), "Exported resume PDF"),
        Err(e) => tracing::error!(file = %path.display(), error = %e, "Failed to write PDF"),
    }
}
