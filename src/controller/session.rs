//! Polling session handles.

use tokio_util::sync::CancellationToken;

use crate::types::JobId;

/// Handle to one live polling session.
///
/// Returned by [`submit`](super::ObfuscatorController::submit). The handle is
/// explicit — there is no ambient "current job" state — and doubles as a
/// completion signal: the token is cancelled when the session ends for any
/// reason (terminal job state, a replacing submission, or an explicit
/// dismiss), so [`cancelled`](Self::cancelled) can be awaited as "session
/// over".
///
/// Cloning yields another handle to the same session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    job_id: JobId,
    token: CancellationToken,
    seq: u64,
}

impl SessionHandle {
    pub(crate) fn new(job_id: JobId, seq: u64) -> Self {
        Self {
            job_id,
            token: CancellationToken::new(),
            seq,
        }
    }

    /// Identifier of the job this session tracks.
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Cancel the session.
    ///
    /// Idempotent — cancelling an already-ended session is a no-op. The
    /// polling task observes the token on its next iteration and stops
    /// without issuing further queries.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the session has ended.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the session ends.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Distinguishes sessions that happen to share a job id.
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancellation_is_idempotent() {
        let session = SessionHandle::new(JobId::new("abc123"), 0);
        assert!(!session.is_cancelled());

        session.cancel();
        assert!(session.is_cancelled());

        // Second cancel is safe and changes nothing
        session.cancel();
        assert!(session.is_cancelled());
    }

    #[tokio::test]
    async fn clones_share_the_same_token() {
        let session = SessionHandle::new(JobId::new("abc123"), 0);
        let observer = session.clone();

        session.cancel();
        observer.cancelled().await;
        assert!(observer.is_cancelled());
    }
}
