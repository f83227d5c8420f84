//! Artifact selection.
//!
//! [`ArtifactSelector`] gates candidates on the required archive extension
//! and holds at most one pending selection. There is no queuing — a newly
//! accepted candidate replaces the previous one, and the submitter takes the
//! slot's contents for the duration of one submission.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ValidationError;
use crate::types::Artifact;

/// Single-slot artifact selector with an extension gate.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone)]
pub struct ArtifactSelector {
    slot: Arc<Mutex<Option<Artifact>>>,
    extension: String,
}

impl ArtifactSelector {
    /// Create a selector requiring the given extension (without the dot).
    ///
    /// Matching is case-insensitive; the extension is stored lowercased.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            extension: extension.into().to_ascii_lowercase(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Artifact>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a candidate file name would pass the extension gate.
    pub fn accepts(&self, name: &str) -> bool {
        name.to_ascii_lowercase()
            .ends_with(&format!(".{}", self.extension))
    }

    /// Offer a candidate for selection.
    ///
    /// Rejects candidates whose name does not carry the required extension;
    /// a rejection leaves any prior selection unchanged. On success the
    /// candidate replaces the prior selection.
    pub fn select(&self, artifact: Artifact) -> Result<(), ValidationError> {
        if !self.accepts(artifact.name()) {
            return Err(ValidationError::UnsupportedExtension {
                name: artifact.name().to_string(),
                extension: self.extension.clone(),
            });
        }
        *self.lock() = Some(artifact);
        Ok(())
    }

    /// Name of the current selection, if any.
    pub fn selected_name(&self) -> Option<String> {
        self.lock().as_ref().map(|a| a.name().to_string())
    }

    /// Size in bytes of the current selection, if any.
    pub fn selected_size(&self) -> Option<u64> {
        self.lock().as_ref().map(Artifact::size)
    }

    /// Take ownership of the current selection, emptying the slot.
    pub fn take(&self) -> Option<Artifact> {
        self.lock().take()
    }

    /// Discard the current selection, if any.
    pub fn clear(&self) {
        *self.lock() = None;
    }
}
