//! Core types for jarshield-client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Opaque job identifier issued by the backend
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new JobId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote job lifecycle state as reported by the status endpoint
///
/// `Pending` and `Processing` are transient and may alternate in either order
/// or be skipped entirely. `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Waiting in the backend queue
    Pending,
    /// Transformation in progress
    Processing,
    /// Finished successfully, result retrievable
    Completed,
    /// Finished with an error
    Failed,
}

impl JobStatus {
    /// Whether this state ends the polling session
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Fixed progress checkpoint shown for this state
    ///
    /// The percentage is a coarse visual proxy, not derived from real backend
    /// progress. The progress snapshot applies it monotonically.
    pub fn progress_checkpoint(&self) -> u8 {
        match self {
            JobStatus::Pending => 30,
            JobStatus::Processing => 60,
            JobStatus::Completed | JobStatus::Failed => 100,
        }
    }

    /// Human-readable status line for this state
    pub fn status_text(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Waiting in queue",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Obfuscation complete",
            JobStatus::Failed => "Obfuscation failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// A user-selected binary artifact awaiting submission
///
/// Immutable after construction. Owned by the selector until handed to the
/// submitter, which consumes it for the duration of one submission.
#[derive(Clone, Debug)]
pub struct Artifact {
    name: String,
    payload: Vec<u8>,
    selected_at: DateTime<Utc>,
}

impl Artifact {
    /// Create an artifact from an in-memory payload
    pub fn from_bytes(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
            selected_at: Utc::now(),
        }
    }

    /// Read an artifact from disk
    ///
    /// The artifact name is the file name component of the path.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| Error::Other(format!("invalid artifact path: {}", path.display())))?;
        let payload = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(name, payload))
    }

    /// File name of the artifact
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload size in bytes
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Raw payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// When the artifact was selected
    pub fn selected_at(&self) -> DateTime<Utc> {
        self.selected_at
    }
}

/// Target JVM release for the transformed output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRelease {
    /// Java 8
    #[serde(rename = "8")]
    Java8,
    /// Java 11
    #[serde(rename = "11")]
    Java11,
    /// Java 17
    #[default]
    #[serde(rename = "17")]
    Java17,
    /// Java 21
    #[serde(rename = "21")]
    Java21,
}

impl std::fmt::Display for TargetRelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TargetRelease::Java8 => "8",
            TargetRelease::Java11 => "11",
            TargetRelease::Java17 => "17",
            TargetRelease::Java21 => "21",
        };
        write!(f, "{s}")
    }
}

/// Validated transformation options, serialized verbatim to the backend
///
/// Built once per submission attempt by
/// [`OptionsForm::build`](crate::options::OptionsForm::build). The scope
/// filter is structurally absent (not merely empty) unless the only-main
/// restriction was enabled, so the backend never sees a misleading partial
/// configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    /// Package restriction; present only when only-main is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_package: Option<String>,

    /// Target JVM release
    #[serde(rename = "javaVersion")]
    pub target_release: TargetRelease,

    /// Encrypt string constants
    pub string_encryption: bool,

    /// Encrypt numeric constants
    pub number_encryption: bool,

    /// Obfuscate conditional control flow
    pub flow_condition: bool,

    /// Obfuscate control flow via exception handlers
    pub flow_exception: bool,

    /// Obfuscate range checks
    pub flow_range: bool,

    /// Obfuscate switch tables
    pub flow_switch: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            main_package: None,
            target_release: TargetRelease::default(),
            string_encryption: true,
            number_encryption: true,
            flow_condition: true,
            flow_exception: true,
            flow_range: true,
            flow_switch: true,
        }
    }
}

/// One submitted transformation request, as tracked by the polling engine
///
/// Created when submission succeeds and mutated only by the polling engine as
/// status snapshots arrive.
#[derive(Clone, Debug)]
pub struct Job {
    /// Backend-issued identifier
    pub id: JobId,
    /// Last observed remote state (`None` until the first snapshot lands)
    pub status: Option<JobStatus>,
    /// Free-text diagnostic carried by a FAILED snapshot
    pub diagnostic: Option<String>,
    /// Structured log lines from the most recent snapshot
    pub log_lines: Vec<String>,
}

impl Job {
    /// Create a freshly-submitted job with no observed state yet
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: None,
            diagnostic: None,
            log_lines: Vec::new(),
        }
    }
}

/// Reactive progress state exposed to the surrounding presentation layer
///
/// Published through a `tokio::sync::watch` channel; see
/// [`ObfuscatorController::progress`](crate::controller::ObfuscatorController::progress).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// The job being tracked, once one exists
    pub job_id: Option<JobId>,
    /// Last observed lifecycle state
    pub status: Option<JobStatus>,
    /// Coarse progress percentage (monotonically non-decreasing per attempt)
    pub percent: u8,
    /// Human-readable status line
    pub status_text: String,
    /// Whether a terminal outcome has been reached
    pub terminal: bool,
    /// Current log lines (replaced wholesale by each snapshot that carries logs)
    pub log_lines: Vec<String>,
    /// Inline diagnostic for a failed outcome
    pub diagnostic: Option<String>,
}

impl ProgressSnapshot {
    /// Snapshot for the idle state (no active job)
    pub fn idle() -> Self {
        Self {
            job_id: None,
            status: None,
            percent: 0,
            status_text: "Idle".to_string(),
            terminal: false,
            log_lines: Vec::new(),
            diagnostic: None,
        }
    }

    /// Snapshot for an attempt whose upload is in flight
    pub fn submitting() -> Self {
        Self {
            job_id: None,
            status: None,
            percent: 10,
            status_text: "Uploading artifact".to_string(),
            terminal: false,
            log_lines: vec!["Starting obfuscation".to_string()],
            diagnostic: None,
        }
    }
}

/// Notification severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Positive outcome
    Success,
    /// Failure the user should see
    Error,
    /// Incidental status information
    Info,
}

/// One entry in the notification feed
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    /// Severity of the entry
    pub kind: NotificationKind,
    /// Display message
    pub message: String,
    /// When the entry was appended
    pub posted_at: DateTime<Utc>,
}

/// Event emitted during the controller lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An artifact passed the selector gate
    ArtifactSelected {
        /// Artifact file name
        name: String,
        /// Payload size in bytes
        size: u64,
    },

    /// Auto-detection suggested a scope filter value
    ScopeDetected {
        /// The detected main package
        package: String,
    },

    /// Submission succeeded and polling is starting
    Submitted {
        /// Backend-issued job identifier
        job_id: JobId,
    },

    /// The observed lifecycle state changed
    StatusChanged {
        /// Job being tracked
        job_id: JobId,
        /// Newly observed state
        status: JobStatus,
    },

    /// The job reached COMPLETED
    Completed {
        /// Job that completed
        job_id: JobId,
        /// Retrieval endpoint for the result
        download_url: String,
    },

    /// The job reached FAILED
    Failed {
        /// Job that failed
        job_id: JobId,
        /// Backend diagnostic, or a generic message if none was supplied
        message: String,
    },

    /// The automatic retrieval trigger fired
    AutoRetrieve {
        /// Job whose result is ready
        job_id: JobId,
        /// Retrieval endpoint the presentation layer should navigate to
        url: String,
    },

    /// Backend reachability changed
    Health {
        /// Whether the last health check succeeded
        healthy: bool,
    },
}

/// One row of the backend's job history listing
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Job identifier
    pub id: JobId,
    /// Name of the submitted artifact
    #[serde(default)]
    pub original_filename: Option<String>,
    /// Final (or current) lifecycle state
    pub status: JobStatus,
    /// Creation timestamp as reported by the backend
    #[serde(default)]
    pub created_at: Option<String>,
    /// Completion timestamp, if finished
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Diagnostic for failed jobs
    #[serde(default)]
    pub error_message: Option<String>,
    /// Human-readable result size, if a result exists
    #[serde(default)]
    pub output_size: Option<String>,
}

/// Format a byte count for display (e.g. `1.50 MB`)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
