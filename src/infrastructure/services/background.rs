//! Bounded fire-and-forget job queue for cache refresh and store work

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify, Semaphore};
use tracing::{debug, warn};

/// A unit of background work
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Default)]
struct Tracker {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl Tracker {
    fn finish_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Decrements the outstanding count even if the job panics
struct CompletionGuard(Arc<Tracker>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.finish_one();
    }
}

/// Queue drained by a dispatcher task; each job runs on its own task
/// once a concurrency permit is free
///
/// Must be created inside a tokio runtime. Jobs still queued or running
/// when the runtime shuts down are dropped.
#[derive(Debug, Clone)]
pub struct BackgroundQueue {
    sender: mpsc::Sender<Job>,
    tracker: Arc<Tracker>,
}

impl Default for BackgroundQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY, DEFAULT_CONCURRENCY)
    }
}

impl BackgroundQueue {
    pub fn new(capacity: usize, concurrency: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Job>(capacity.max(1));
        let tracker = Arc::new(Tracker::default());
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let dispatch_tracker = tracker.clone();

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let guard = CompletionGuard(dispatch_tracker.clone());
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };

                tokio::spawn(async move {
                    let _guard = guard;
                    let _permit = permit;
                    job.await;
                });
            }
            debug!("Background queue closed");
        });

        Self { sender, tracker }
    }

    /// Enqueues a job without waiting; returns false if the queue is full
    pub fn submit<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.outstanding.fetch_add(1, Ordering::SeqCst);

        match self.sender.try_send(Box::pin(job)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Background queue full, dropping job");
                self.tracker.finish_one();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Background queue closed, dropping job");
                self.tracker.finish_one();
                false
            }
        }
    }

    /// Jobs queued or running
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding.load(Ordering::SeqCst)
    }

    /// Waits until no job is queued or running; false on timeout
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.tracker.idle.notified();
                if self.outstanding() == 0 {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_runs_submitted_jobs() {
        let queue = BackgroundQueue::default();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = counter.clone();
            assert!(queue.submit(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert!(queue.wait_idle(Duration::from_secs(5)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_idle_when_nothing_submitted() {
        let queue = BackgroundQueue::default();
        assert!(queue.wait_idle(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_wait_idle_times_out_on_stuck_job() {
        let queue = BackgroundQueue::default();
        let (_tx, rx) = oneshot::channel::<()>();
        queue.submit(async move {
            let _ = rx.await;
        });

        assert!(!queue.wait_idle(Duration::from_millis(50)).await);
        assert_eq!(queue.outstanding(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_job() {
        let queue = BackgroundQueue::new(1, 1);
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<()>();

        queue.submit(async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
        });
        started_rx.await.unwrap();

        // Only one slot; the dispatcher cannot drain it between submits.
        let ran = Arc::new(AtomicBool::new(false));
        let mut accepted = 0;
        for _ in 0..3 {
            let ran = ran.clone();
            if queue.submit(async move {
                ran.store(true, Ordering::SeqCst);
            }) {
                accepted += 1;
            }
        }
        assert!(accepted < 3);

        release_tx.send(()).unwrap();
        assert!(queue.wait_idle(Duration::from_secs(5)).await);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_job_still_counts_as_done() {
        let queue = BackgroundQueue::default();
        queue.submit(async {
            panic!("job failed");
        });

        assert!(queue.wait_idle(Duration::from_secs(5)).await);
    }
}
