//! Polling engine — the state machine tracking one job to a terminal outcome.
//!
//! Once a job identifier exists the engine fires a status query immediately,
//! then on the fixed configured interval until a terminal state is observed
//! or the session is cancelled. Queries are strictly sequential: the next
//! tick is not consumed until the previous response (success or failure) has
//! been processed, so there is never more than one in-flight query per job.

use tokio::time::MissedTickBehavior;

use crate::api::StatusSnapshot;
use crate::types::{Event, Job, JobStatus, NotificationKind};

use super::{ObfuscatorController, SessionHandle};

/// Diagnostic used when a FAILED snapshot carries no message.
const UNKNOWN_ERROR: &str = "Unknown error";

impl ObfuscatorController {
    /// Run the poll loop for one session. Spawned by `submit`.
    pub(crate) async fn run_poller(&self, mut job: Job, session: SessionHandle) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Cancellation is checked before the tick so a cancelled
                // session never consumes a pending timer firing.
                biased;
                _ = session.cancelled() => {
                    tracing::debug!(job_id = %job.id, "polling session cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.api.status(&job.id).await {
                Ok(snapshot) => {
                    if self.apply_status(&mut job, snapshot) {
                        break;
                    }
                }
                Err(e) => {
                    // Transport failures never advance the state machine;
                    // the next scheduled query is still attempted.
                    tracing::warn!(job_id = %job.id, error = %e, "status query failed");
                }
            }
        }

        self.finish_session(&session);
    }

    /// Fold one status snapshot into the tracked job and the progress
    /// surface. Returns whether a terminal state was reached.
    fn apply_status(&self, job: &mut Job, snapshot: StatusSnapshot) -> bool {
        let status = snapshot.status;
        let changed = job.status != Some(status);
        job.status = Some(status);

        if let Some(message) = snapshot.error_message {
            job.diagnostic = Some(message);
        }
        if let Some(raw) = snapshot.logs.as_deref() {
            // Replaced wholesale, never appended.
            job.log_lines = split_log_lines(raw);
        }

        let diagnostic = if status == JobStatus::Failed {
            Some(
                job.diagnostic
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            )
        } else {
            None
        };

        self.progress_tx.send_modify(|s| {
            s.job_id = Some(job.id.clone());
            s.status = Some(status);
            // Coarse visual proxy, monotone per attempt even if the backend
            // reports PENDING after PROCESSING.
            s.percent = s.percent.max(status.progress_checkpoint());
            s.status_text = status.status_text().to_string();
            s.terminal = status.is_terminal();
            s.log_lines = job.log_lines.clone();
            s.diagnostic = diagnostic.clone();
        });

        if changed {
            tracing::info!(job_id = %job.id, status = %status, "job status changed");
            self.emit_event(Event::StatusChanged {
                job_id: job.id.clone(),
                status,
            });
        }

        match status {
            JobStatus::Completed => {
                self.handle_completed(job, snapshot.download_url);
                true
            }
            JobStatus::Failed => {
                self.handle_failed(job, diagnostic.unwrap_or_else(|| UNKNOWN_ERROR.to_string()));
                true
            }
            JobStatus::Pending | JobStatus::Processing => false,
        }
    }

    fn handle_completed(&self, job: &Job, advertised_url: Option<String>) {
        let url = advertised_url.unwrap_or_else(|| self.api.download_url(&job.id));

        self.notifications.push(
            NotificationKind::Success,
            "Obfuscation completed successfully",
        );
        self.emit_event(Event::Completed {
            job_id: job.id.clone(),
            download_url: url.clone(),
        });

        // One automatic retrieval trigger after a short delay; the manual
        // action stays available indefinitely.
        let delay = self.config.auto_retrieve_delay;
        let controller = self.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.emit_event(Event::AutoRetrieve { job_id, url });
        });
    }

    fn handle_failed(&self, job: &Job, diagnostic: String) {
        self.notifications
            .push(NotificationKind::Error, diagnostic.clone());
        self.emit_event(Event::Failed {
            job_id: job.id.clone(),
            message: diagnostic,
        });
    }

    /// Dismantle the session: cancel its token (idempotent — it may already
    /// be cancelled externally) and clear the slot if it still holds this
    /// session. A replacing submission may have installed a newer session,
    /// which must not be disturbed.
    fn finish_session(&self, session: &SessionHandle) {
        session.cancel();
        let mut slot = self.lock_session();
        if slot.as_ref().is_some_and(|current| current.seq() == session.seq()) {
            *slot = None;
        }
    }
}

/// Newline-split, blank-filtered log lines from a raw backend log blob.
fn split_log_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}
