//! Per-subscription driver loop.
//!
//! Opens the connection for one job, reads frames until the stream ends
//! or the subscription is cancelled, runs each event through
//! [`reduce`], publishes the resulting snapshot, and invokes the
//! completion callback on the success transition.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::{Connection, Connector, Frame};
use crate::state::{reduce, JobSnapshot, StreamEvent, Transition};

/// Completion callback, invoked with the job result at most once.
pub type OnSuccess = Box<dyn FnOnce(serde_json::Value) + Send>;

/// Drive one subscription from connect to teardown.
///
/// Cancellation is checked before every state change, so once `cancel`
/// is triggered no snapshot update or callback happens. The connection
/// is closed exactly once on the way out.
pub(crate) async fn run_subscription<C: Connector + ?Sized>(
    connector: Arc<C>,
    job_id: String,
    state_tx: Arc<watch::Sender<JobSnapshot>>,
    mut on_success: Option<OnSuccess>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connector.connect(&job_id) => result,
    };

    let mut connection = match connected {
        Ok(connection) => connection,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Job stream connection failed");
            if !cancel.is_cancelled() {
                publish(&state_tx, StreamEvent::TransportError(&e.to_string()));
            }
            return;
        }
    };

    if cancel.is_cancelled() {
        connection.close().await;
        return;
    }
    publish(&state_tx, StreamEvent::Opened);

    process_frames(&mut *connection, &job_id, &state_tx, &mut on_success, &cancel).await;

    connection.close().await;
    tracing::info!(job_id = %job_id, "Job stream closed");
}

/// Read frames until the stream ends, fails, or is cancelled.
async fn process_frames(
    connection: &mut dyn Connection,
    job_id: &str,
    state_tx: &watch::Sender<JobSnapshot>,
    on_success: &mut Option<OnSuccess>,
    cancel: &CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            frame = connection.next_frame() => frame,
        };

        // A frame that raced with teardown is dropped silently.
        if cancel.is_cancelled() {
            return;
        }

        match frame {
            Some(Ok(Frame::Text(text))) => {
                handle_text(&text, job_id, state_tx, on_success);
            }
            Some(Ok(Frame::Binary)) => {
                tracing::trace!(job_id, "Ignoring binary frame");
            }
            Some(Ok(Frame::Close)) | None => {
                publish(state_tx, StreamEvent::Closed);
                tracing::info!(job_id, "Server ended job stream");
                return;
            }
            Some(Err(e)) => {
                tracing::error!(job_id, error = %e, "Job stream receive error");
                publish(state_tx, StreamEvent::TransportError(&e.to_string()));
                return;
            }
        }
    }
}

fn handle_text(
    text: &str,
    job_id: &str,
    state_tx: &watch::Sender<JobSnapshot>,
    on_success: &mut Option<OnSuccess>,
) {
    match publish(state_tx, StreamEvent::Frame(text)) {
        Transition::Completed(result) => {
            tracing::info!(job_id, "Job completed");
            if let Some(callback) = on_success.take() {
                callback(result);
            }
        }
        Transition::Invalid(error) => {
            tracing::warn!(
                job_id,
                error = %error,
                raw_message = %text,
                "Malformed job status message",
            );
        }
        Transition::Updated => {
            let snapshot = state_tx.borrow();
            tracing::debug!(
                job_id,
                state = ?snapshot.state,
                phase = ?snapshot.phase,
                progress = snapshot.progress,
                "Job status updated",
            );
        }
        Transition::Unchanged => {
            tracing::debug!(job_id, "Job already terminal, message ignored");
        }
    }
}

/// Apply an event to the shared snapshot, notifying watchers only when
/// something changed.
fn publish(state_tx: &watch::Sender<JobSnapshot>, event: StreamEvent<'_>) -> Transition {
    let mut transition = Transition::Unchanged;
    state_tx.send_if_modified(|snapshot| {
        transition = reduce(snapshot, event);
        transition.is_change()
    });
    transition
}
