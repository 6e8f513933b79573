use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Shared stop flag observed cooperatively by every virtual user.
#[derive(Debug, Clone, Default)]
pub struct RunSignal {
    stopped: Arc<AtomicBool>,
    token: CancellationToken,
}

impl RunSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Returns `true` only for the call that flipped the flag.
    pub fn stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::AcqRel);
        if first {
            self.token.cancel();
        }
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Resolves once [`RunSignal::stop`] has been called.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn stop_is_idempotent() {
        let signal = RunSignal::new();
        assert!(!signal.is_stopped());

        assert!(signal.stop());
        assert!(!signal.stop());
        assert!(signal.is_stopped());
    }

    #[tokio::test]
    async fn clones_observe_the_same_stop() {
        let signal = RunSignal::new();
        let observer = signal.clone();

        let waiter = tokio::spawn(async move {
            observer.stopped().await;
            observer.is_stopped()
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.stop();

        let seen = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(seen, Ok(Ok(true))));
    }
}
