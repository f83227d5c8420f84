//! Best-effort notification feed.
//!
//! [`NotificationFeed`] is an append-only feed of incidental status events.
//! Each entry stays visible for a fixed lifetime and is then discarded by a
//! fire-and-forget expiry task. Entries keep insertion order; there is no
//! persistence and no deduplication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::types::{Notification, NotificationKind};

/// Append-only feed with TTL-expiring entries.
///
/// Cloning yields another handle to the same feed.
#[derive(Clone)]
pub struct NotificationFeed {
    entries: Arc<Mutex<Vec<(u64, Notification)>>>,
    next_id: Arc<AtomicU64>,
    ttl: Duration,
}

impl NotificationFeed {
    /// Create a feed whose entries live for `ttl` before being discarded.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Notification)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry and schedule its expiry.
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            kind,
            message: message.into(),
            posted_at: Utc::now(),
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, notification));

        // Fire-and-forget expiry; the feed outlives the task via its Arc.
        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(entry_id, _)| *entry_id != id);
        });
    }

    /// Currently visible entries, in insertion order.
    pub fn active(&self) -> Vec<Notification> {
        self.lock().iter().map(|(_, n)| n.clone()).collect()
    }

    /// Number of currently visible entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the feed is currently empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
