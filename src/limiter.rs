//! Admission control for concurrent requests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Capacity of the search fan-out limiter.
pub const SEARCH_CONCURRENCY: usize = 5;

/// Capacity of the detail and cover lookup limiter.
pub const DETAIL_CONCURRENCY: usize = 3;

/// Bounds the number of simultaneously running operations of one class.
///
/// Waiting submissions are admitted in arrival order. Each submission keeps
/// its own outcome; a failing operation does not affect the others.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter admitting at most `max_concurrent` operations.
    pub fn new(max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Runs `f` once a slot is free.
    pub async fn run<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // The semaphore is never closed, so acquisition cannot fail.
        let _permit = self.semaphore.acquire().await.ok();
        f().await
    }

    /// Maximum number of concurrent operations.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of operations currently running.
    pub fn active(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::future::join_all;

    #[test]
    fn test_limiter_new() {
        let limiter = ConcurrencyLimiter::new(3);
        assert_eq!(limiter.capacity(), 3);
        assert_eq!(limiter.active(), 0);
    }

    #[test]
    fn test_limiter_zero_capacity_is_clamped() {
        let limiter = ConcurrencyLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_never_exceeds_capacity() {
        let limiter = ConcurrencyLimiter::new(3);
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let (running, peak, completed_ref) = (&running, &peak, &completed);

        let tasks = (0..10).map(|_| {
            limiter.run(move || async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                completed_ref.fetch_add(1, Ordering::SeqCst);
            })
        });
        join_all(tasks).await;

        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(completed.load(Ordering::SeqCst), 10);
        assert_eq!(limiter.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_admits_in_fifo_order() {
        let limiter = ConcurrencyLimiter::new(1);
        let order = Mutex::new(Vec::new());

        let tasks = (0..5).map(|i| {
            let limiter = &limiter;
            let order = &order;
            async move {
                limiter
                    .run(|| async move {
                        order.lock().unwrap().push(i);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    })
                    .await
            }
        });
        join_all(tasks).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_limiter_isolates_failures() {
        let limiter = ConcurrencyLimiter::new(2);
        let tasks = (0..4).map(|i| {
            limiter.run(move || async move {
                if i % 2 == 0 {
                    Err(format!("task {} failed", i))
                } else {
                    Ok(i)
                }
            })
        });
        let results = join_all(tasks).await;

        assert!(results[0].is_err());
        assert_eq!(results[1], Ok(1));
        assert!(results[2].is_err());
        assert_eq!(results[3], Ok(3));
    }

    #[tokio::test]
    async fn test_limiter_clones_share_slots() {
        let limiter = ConcurrencyLimiter::new(2);
        let clone = limiter.clone();
        let observed = limiter.run(|| async { clone.active() }).await;
        assert_eq!(observed, 1);
    }
}
