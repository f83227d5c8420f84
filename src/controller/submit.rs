//! Submission path — the network handoff of artifact + options.

use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::options::OptionsForm;
use crate::types::{Event, Job, NotificationKind, ProgressSnapshot};

use super::{ObfuscatorController, SessionHandle};

impl ObfuscatorController {
    /// Submit the selected artifact with the options assembled from `form`.
    ///
    /// Validates the form, takes ownership of the selected artifact, cancels
    /// any session still in flight, and performs exactly one submission
    /// exchange. On success a [`SessionHandle`] for the new polling session
    /// is returned and exactly one info notification carrying the job
    /// identifier is appended before this method returns. A failed
    /// submission is terminal for the attempt — there is no automatic retry,
    /// and the artifact must be re-selected to try again.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use jarshield_client::{Artifact, Config, ObfuscatorController, OptionsForm};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let controller = ObfuscatorController::new(Config::default())?;
    /// controller.select(Artifact::from_bytes("app.jar", std::fs::read("app.jar")?))?;
    ///
    /// let session = controller.submit(&OptionsForm::default()).await?;
    /// session.cancelled().await; // resolves when the job reaches a terminal state
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, form: &OptionsForm) -> Result<SessionHandle> {
        let options = form.build()?;
        let artifact = self.selector.take().ok_or(Error::NoArtifact)?;

        // At most one session may be live; a replacing submission dismantles
        // the previous timer before anything else happens.
        if let Some(previous) = self.lock_session().take() {
            tracing::info!(job_id = %previous.job_id(), "cancelling previous polling session");
            previous.cancel();
        }

        self.progress_tx.send_replace(ProgressSnapshot::submitting());

        tracing::info!(
            artifact = artifact.name(),
            size = artifact.size(),
            "submitting obfuscation job"
        );

        match self.api.submit(&artifact, &options).await {
            Ok(job_id) => {
                self.notifications.push(
                    NotificationKind::Info,
                    format!("Obfuscation job {job_id} started"),
                );

                self.progress_tx.send_modify(|s| {
                    s.job_id = Some(job_id.clone());
                    s.percent = s.percent.max(20);
                    s.status_text = "Obfuscation in progress".to_string();
                    s.log_lines.push(format!("Job created: {job_id}"));
                });

                self.emit_event(Event::Submitted {
                    job_id: job_id.clone(),
                });

                let seq = self.session_seq.fetch_add(1, Ordering::Relaxed);
                let session = SessionHandle::new(job_id.clone(), seq);
                *self.lock_session() = Some(session.clone());

                // The slot holds the identifier before the first poll fires.
                let controller = self.clone();
                let poller_session = session.clone();
                tokio::spawn(async move {
                    controller.run_poller(Job::new(job_id), poller_session).await;
                });

                Ok(session)
            }
            Err(submission_error) => {
                let reason = submission_error.to_string();
                tracing::warn!(
                    artifact = artifact.name(),
                    error = %reason,
                    "submission failed"
                );

                self.notifications
                    .push(NotificationKind::Error, reason.clone());

                self.progress_tx.send_modify(|s| {
                    s.status_text = format!("Error: {reason}");
                    s.terminal = true;
                    s.diagnostic = Some(reason);
                });

                Err(Error::Submission(submission_error))
            }
        }
    }
}
