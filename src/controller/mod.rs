//! Asynchronous job lifecycle controller.
//!
//! [`ObfuscatorController`] is the owning context for one user-facing
//! workflow: select an artifact, assemble options, submit, poll to a
//! terminal outcome, retrieve the result. The controller's methods are
//! organized by stage:
//! - this module - construction, selection, events, shared surfaces
//! - [`session`] - explicit session handles
//! - `submit` - the submission path
//! - `poller` - the polling engine state machine
//!
//! All state lives behind this struct; there are no ambient singletons.
//! Cloning is cheap (all fields are handles) and every clone drives the same
//! controller.

pub mod session;

mod poller;
mod submit;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use session::SessionHandle;

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_stream::wrappers::BroadcastStream;

use crate::api::ObfuscatorApi;
use crate::config::Config;
use crate::error::Result;
use crate::notifications::NotificationFeed;
use crate::options::ScopeField;
use crate::selector::ArtifactSelector;
use crate::types::{
    Artifact, Event, HistoryEntry, JobId, NotificationKind, ProgressSnapshot,
};

/// Controller for the obfuscation workflow (cloneable - all fields are handles).
#[derive(Clone)]
pub struct ObfuscatorController {
    /// REST client for the backend service
    pub(crate) api: Arc<ObfuscatorApi>,
    /// Static configuration
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Reactive progress snapshot published to the presentation layer
    pub(crate) progress_tx: Arc<tokio::sync::watch::Sender<ProgressSnapshot>>,
    /// Notification feed for incidental status events
    pub(crate) notifications: NotificationFeed,
    /// Single-slot artifact selector
    pub(crate) selector: ArtifactSelector,
    /// Shared scope-filter field (auto-detect race guard)
    pub(crate) scope: ScopeField,
    /// At most one live polling session
    pub(crate) session: Arc<Mutex<Option<SessionHandle>>>,
    /// Monotonic counter distinguishing sessions
    pub(crate) session_seq: Arc<AtomicU64>,
}

impl ObfuscatorController {
    /// Create a new controller.
    ///
    /// Validates the configuration and wires up the event bus, the progress
    /// snapshot channel, and the notification feed. No network traffic
    /// happens until an operation is invoked.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_buffer);
        let (progress_tx, _) = tokio::sync::watch::channel(ProgressSnapshot::idle());

        Ok(Self {
            api: Arc::new(ObfuscatorApi::new(config.base_url.clone())),
            selector: ArtifactSelector::new(config.artifact_extension.clone()),
            scope: ScopeField::new(),
            notifications: NotificationFeed::new(config.notification_ttl),
            session: Arc::new(Mutex::new(None)),
            session_seq: Arc::new(AtomicU64::new(0)),
            progress_tx: Arc::new(progress_tx),
            event_tx,
            config: Arc::new(config),
        })
    }

    /// Subscribe to controller events.
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. A subscriber that falls behind the configured buffer
    /// receives a `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Subscribe to controller events as a `Stream`.
    pub fn event_stream(&self) -> BroadcastStream<Event> {
        BroadcastStream::new(self.subscribe())
    }

    /// Watch the reactive progress snapshot.
    ///
    /// The receiver yields the percentage, status text, terminal flag, and
    /// log lines the presentation layer renders.
    pub fn progress(&self) -> tokio::sync::watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    /// The notification feed.
    pub fn notifications(&self) -> &NotificationFeed {
        &self.notifications
    }

    /// The shared scope-filter field the embedding UI binds to.
    pub fn scope_field(&self) -> &ScopeField {
        &self.scope
    }

    /// The artifact selector.
    pub fn selector(&self) -> &ArtifactSelector {
        &self.selector
    }

    /// Handle to the live polling session, if one exists.
    pub fn current_session(&self) -> Option<SessionHandle> {
        self.lock_session().clone()
    }

    /// Offer a candidate artifact for selection.
    ///
    /// Rejections surface as an error notification and leave any prior
    /// selection unchanged. On success the scope field resets and a
    /// best-effort auto-detect request is fired in the background; its
    /// failure is silently absorbed and its suggestion never overwrites a
    /// field the user already edited.
    pub fn select(&self, artifact: Artifact) -> Result<()> {
        let name = artifact.name().to_string();
        let size = artifact.size();

        if !self.selector.accepts(&name) {
            let err = crate::error::ValidationError::UnsupportedExtension {
                name,
                extension: self.config.artifact_extension.to_ascii_lowercase(),
            };
            self.notifications
                .push(NotificationKind::Error, err.to_string());
            return Err(err.into());
        }

        // The detect task needs the payload after the slot takes ownership.
        let detect_copy = artifact.clone();
        self.selector.select(artifact)?;
        self.scope.reset();

        tracing::info!(artifact = %name, size, "artifact selected");
        self.emit_event(Event::ArtifactSelected { name, size });

        let controller = self.clone();
        tokio::spawn(async move {
            controller.detect_scope(detect_copy).await;
        });

        Ok(())
    }

    /// Cancel any live session and reset the progress surface to idle.
    ///
    /// Safe to call repeatedly and with no session active.
    pub fn dismiss(&self) {
        if let Some(session) = self.lock_session().take() {
            tracing::info!(job_id = %session.job_id(), "session dismissed");
            session.cancel();
        }
        self.progress_tx.send_replace(ProgressSnapshot::idle());
    }

    /// Retrieval endpoint for a job's result.
    ///
    /// Pure derivation; the caller is expected to gate on the job having
    /// reached COMPLETED (the progress snapshot carries the state).
    pub fn download_url(&self, job_id: &JobId) -> String {
        self.api.download_url(job_id)
    }

    /// Fetch recent jobs from the backend history.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        self.api.history(limit).await
    }

    /// Whether the backend currently reports itself healthy.
    ///
    /// An unreachable backend counts as unhealthy.
    pub async fn health(&self) -> bool {
        self.api.health().await.unwrap_or(false)
    }

    /// Spawn a background task that re-checks backend health on the
    /// configured interval and emits [`Event::Health`] on transitions.
    ///
    /// The task runs until aborted via the returned handle.
    pub fn spawn_health_monitor(&self) -> tokio::task::JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(controller.config.health_check_interval);
            let mut last: Option<bool> = None;
            loop {
                ticker.tick().await;
                let healthy = controller.health().await;
                if last != Some(healthy) {
                    tracing::info!(healthy, "backend health changed");
                    controller.emit_event(Event::Health { healthy });
                    last = Some(healthy);
                }
            }
        })
    }

    /// Emit an event to all subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped,
    /// so the workflow continues even when no one is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    pub(crate) fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<SessionHandle>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort scope auto-detection for a freshly selected artifact.
    ///
    /// Never fails the selection: every error is absorbed here.
    async fn detect_scope(&self, artifact: Artifact) {
        match self.api.analyze(&artifact).await {
            Ok(report) => {
                let Some(package) = report.main_package else {
                    tracing::debug!(artifact = artifact.name(), "no main package detected");
                    return;
                };
                if self.scope.suggest(package.as_str()) {
                    tracing::info!(artifact = artifact.name(), package = %package, "scope filter detected");
                    self.notifications
                        .push(NotificationKind::Success, format!("Detected package: {package}"));
                    self.emit_event(Event::ScopeDetected { package });
                } else {
                    tracing::debug!(
                        artifact = artifact.name(),
                        "scope field already edited, keeping the user's value"
                    );
                }
            }
            Err(e) => {
                tracing::debug!(artifact = artifact.name(), error = %e, "artifact analysis failed");
            }
        }
    }
}
