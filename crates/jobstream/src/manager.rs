//! Caller-facing job stream client.
//!
//! [`JobStreamClient`] owns at most one live subscription. Subscribing
//! to a new job id tears down the previous one first, so a caller never
//! holds two transports at once. State is observed through
//! [`JobStreamClient::snapshot`] or a [`tokio::sync::watch`] receiver
//! from [`JobStreamClient::watch`]; errors are recorded there and never
//! returned to the caller.

use std::sync::Arc;

use resumeiq_core::types::JobId;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::Connector;
use crate::processor::{run_subscription, OnSuccess};
use crate::state::JobSnapshot;

/// Streams status updates for one job at a time.
///
/// Only [`unsubscribe`](Self::unsubscribe)`.await` (or a following
/// `subscribe`) guarantees that no snapshot update or callback happens
/// after teardown. Dropping the client cancels the driver without
/// waiting for it, so a frame already being handled may still land.
pub struct JobStreamClient<C: Connector> {
    connector: Arc<C>,
    state_tx: Arc<watch::Sender<JobSnapshot>>,
    active: Option<ActiveSubscription>,
}

/// Internal bookkeeping for the live subscription.
struct ActiveSubscription {
    job_id: JobId,
    task_handle: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl<C: Connector> JobStreamClient<C> {
    /// Create an idle client. No connection is opened until
    /// [`subscribe`](Self::subscribe) is called with a job id.
    pub fn new(connector: C) -> Self {
        let (state_tx, _) = watch::channel(JobSnapshot::default());
        Self {
            connector: Arc::new(connector),
            state_tx: Arc::new(state_tx),
            active: None,
        }
    }

    /// Start streaming status for `job_id`.
    ///
    /// Any previous subscription is torn down first. An empty job id
    /// leaves the client idle with a neutral snapshot and opens nothing.
    /// `on_success` fires at most once, with the job result, when the
    /// job first reaches the success phase.
    pub async fn subscribe(&mut self, job_id: impl Into<JobId>, on_success: Option<OnSuccess>) {
        let job_id = job_id.into();
        self.unsubscribe().await;

        if job_id.is_empty() {
            self.state_tx.send_replace(JobSnapshot::default());
            tracing::debug!("Empty job id, stream client idle");
            return;
        }

        self.state_tx.send_replace(JobSnapshot::connecting());

        let cancel = CancellationToken::new();
        let task_handle = tokio::spawn(run_subscription(
            Arc::clone(&self.connector),
            job_id.clone(),
            Arc::clone(&self.state_tx),
            on_success,
            cancel.clone(),
        ));

        tracing::info!(job_id = %job_id, "Job stream subscribed");

        self.active = Some(ActiveSubscription {
            job_id,
            task_handle,
            cancel,
        });
    }

    /// Tear down the live subscription, if any.
    ///
    /// Closes the transport and waits for the driver task to exit. Once
    /// this returns, the snapshot is frozen at its last value and the
    /// completion callback can no longer fire.
    pub async fn unsubscribe(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.cancel.cancel();
        if let Err(e) = active.task_handle.await {
            tracing::warn!(job_id = %active.job_id, error = %e, "Job stream task did not exit cleanly");
        }
        tracing::info!(job_id = %active.job_id, "Job stream unsubscribed");
    }

    /// Current snapshot of the subscribed job.
    pub fn snapshot(&self) -> JobSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Receiver notified on every snapshot change. Stays valid across
    /// subscriptions.
    pub fn watch(&self) -> watch::Receiver<JobSnapshot> {
        self.state_tx.subscribe()
    }

    /// Clear the recorded error without touching the rest of the
    /// snapshot.
    pub fn clear_error(&self) {
        self.state_tx.send_if_modified(|snapshot| snapshot.error.take().is_some());
    }

    /// Job id of the live subscription.
    pub fn job_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.job_id.as_str())
    }

    /// Whether a subscription is currently held.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl<C: Connector> Drop for JobStreamClient<C> {
    fn drop(&mut self) {
        // Best effort: the driver is not joined and closes its transport
        // on its own once cancelled.
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}
