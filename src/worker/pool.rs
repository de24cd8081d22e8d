use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};
use crate::worker::{WorkerError, WorkerResult};

/// Bounded pool that runs CPU-heavy jobs on tokio's blocking threads.
///
/// At most `worker_count` jobs execute at once; further submissions wait for a
/// permit. Clones share the same permits.
#[derive(Clone)]
pub struct WorkerPool {
    active_workers: Arc<Mutex<usize>>,
    semaphore: Arc<Semaphore>,
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        debug!("Creating worker pool with {} workers", worker_count);
        Self {
            active_workers: Arc::new(Mutex::new(0)),
            semaphore: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        }
    }

    /// Runs `job` on a blocking thread once a worker is free and resolves to its output.
    pub async fn run<F, T>(&self, label: &str, job: F) -> WorkerResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        debug!("Acquiring worker for task: {}", label);
        let _permit = self.semaphore.acquire().await.map_err(|e| {
            warn!("Failed to acquire semaphore: {}", e);
            WorkerError::from(e)
        })?;

        {
            let mut count = self.active_workers.lock().await;
            *count += 1;
            debug!(
                "Worker started - Active: {}/{}, Available permits: {}, Task: {}",
                *count, self.worker_count, self.semaphore.available_permits(), label
            );
        }

        let result = tokio::task::spawn_blocking(job).await;

        {
            let mut count = self.active_workers.lock().await;
            *count = count.saturating_sub(1);
            debug!("Worker finished - Active: {}/{}, Task: {}", *count, self.worker_count, label);
        }

        result.map_err(|e| {
            warn!("Worker job for {} did not complete: {}", label, e);
            WorkerError::from(e)
        })
    }

    pub async fn active_workers(&self) -> usize {
        *self.active_workers.lock().await
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_worker_count() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(&format!("job {i}"), move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    i * 2
                })
                .await
            }));
        }

        let mut outputs = Vec::new();
        for handle in handles {
            outputs.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(outputs, (0..8).map(|i| i * 2).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.active_workers().await, 0);
    }

    #[tokio::test]
    async fn panicking_job_becomes_an_error() {
        let pool = WorkerPool::new(1);
        let result: WorkerResult<()> = pool.run("boom", || panic!("job failed")).await;
        assert!(matches!(result, Err(WorkerError::ProcessingError(_))));

        let after = pool.run("after", || 7).await.unwrap();
        assert_eq!(after, 7);
    }

    #[test]
    fn zero_workers_is_raised_to_one() {
        assert_eq!(WorkerPool::new(0).worker_count(), 1);
    }
}
