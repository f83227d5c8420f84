//! # jarshield-client
//!
//! Embeddable async client library for the JarShield JVM bytecode
//! obfuscation service.
//!
//! The crate drives the full submission workflow against a remote service:
//! select a `.jar` artifact, assemble transformation options, submit, poll
//! the job to a terminal outcome, and retrieve the result — while exposing a
//! reactive progress surface and a notification feed for the embedding
//! presentation layer.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events and watch a progress
//!   snapshot; no polling of the controller required
//! - **Explicit sessions** - Submissions return a cancellable
//!   [`SessionHandle`]; there is no ambient "current job" state
//! - **Sensible defaults** - Works against a localhost service with zero
//!   configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use jarshield_client::{Artifact, Config, ObfuscatorController, OptionsForm};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = ObfuscatorController::new(Config {
//!         base_url: "http://127.0.0.1:8080/api".to_string(),
//!         ..Config::default()
//!     })?;
//!
//!     // Subscribe to events
//!     let mut events = controller.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Select, submit, and wait for the terminal outcome
//!     controller.select(Artifact::from_path("app.jar").await?)?;
//!     let session = controller.submit(&OptionsForm::default()).await?;
//!     session.cancelled().await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API client
pub mod api;
/// Configuration types
pub mod config;
/// Job lifecycle controller (decomposed into focused submodules)
pub mod controller;
/// Error types
pub mod error;
/// Notification feed
pub mod notifications;
/// Transformation option assembly
pub mod options;
/// Artifact selection
pub mod selector;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use api::{AnalyzeReport, ObfuscatorApi, StatusSnapshot};
pub use config::Config;
pub use controller::{ObfuscatorController, SessionHandle};
pub use error::{Error, Result, SubmissionError, ValidationError};
pub use notifications::NotificationFeed;
pub use options::{OptionsForm, ScopeField};
pub use selector::ArtifactSelector;
pub use types::{
    Artifact, Event, HistoryEntry, Job, JobId, JobStatus, Notification, NotificationKind,
    ProgressSnapshot, TargetRelease, TransformOptions, format_file_size,
};

/// Helper function to run the controller with graceful signal handling.
///
/// Waits for a termination signal, then dismisses any live polling session so
/// no timers are left behind.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a Ctrl+C fallback if
///   signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use jarshield_client::{Config, ObfuscatorController, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let controller = ObfuscatorController::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(controller).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(controller: ObfuscatorController) -> Result<()> {
    wait_for_signal().await;
    controller.dismiss();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        _ => {
            tracing::warn!("Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
