//! A tiny one-shot timer scheduler on top of the Tokio runtime.
//!
//! Scheduled jobs are plain closures run once after a delay. Aborting a
//! [`ScheduledTask`] only helps while the job is still sleeping; once the
//! closure runs it cannot be interrupted, so jobs must re-check their own
//! validity (epoch, ticket) under the session lock before mutating anything.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler bound to the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, like `tokio::spawn`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Like [`Scheduler::current`] but returns `None` outside a runtime.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    pub fn schedule<F>(&self, delay: Duration, job: F) -> ScheduledTask
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });
        ScheduledTask { handle }
    }
}

/// Handle to one scheduled job. Dropping it detaches the job.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let task = Scheduler::current().schedule(Duration::from_millis(500), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        tokio::task::yield_now().await;
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_never_runs() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let task = Scheduler::current().schedule(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_try_current_outside_runtime() {
        assert!(Scheduler::try_current().is_none());
    }
}
