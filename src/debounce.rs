use std::future::Future;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Runs the most recently scheduled job once `interval` has passed without a
/// newer one. Scheduling or cancelling aborts whatever is still waiting.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            job.await;
        });
        self.pending = Some(handle.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
