//! Stop flag plus abort signal for one in-flight request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Raised once by the user; afterwards nothing may paint.
///
/// Clones share the same flag, so a signal handler can hold one while the
/// ingestion loop checks another.
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    stopped: Arc<AtomicBool>,
    abort: CancellationToken,
}

impl CancellationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stop flag and raise the abort signal. Idempotent.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!("stop requested");
        }
        self.abort.cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once [`stop`](Self::stop) has been called.
    pub async fn aborted(&self) {
        self.abort.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let gate = CancellationGate::new();
        let handle = gate.clone();
        assert!(!gate.is_stopped());
        handle.stop();
        handle.stop();
        assert!(gate.is_stopped());
    }

    #[tokio::test]
    async fn aborted_resolves_after_stop() {
        let gate = CancellationGate::new();
        gate.stop();
        gate.aborted().await;
        assert!(gate.is_stopped());
    }
}
