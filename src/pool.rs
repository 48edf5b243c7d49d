//! Bounded pool for independent async tasks.
//!
//! [`run_pool`] drives a list of futures with at most `concurrency` of them
//! in flight. A fixed set of workers repeatedly claims the next unclaimed
//! index from a shared atomic counter and awaits that task. Results land in
//! a pre-sized slot per index, so the output order always matches the input
//! order regardless of completion order.
//!
//! Workers run on the caller's task; nothing is spawned. The first task
//! error is returned immediately, and the remaining in-flight tasks are
//! dropped with the pool future.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use futures::future::try_join_all;

/// Number of workers for `task_count` tasks: at least 1, at most `task_count`.
pub fn effective_concurrency(requested: i64, task_count: usize) -> usize {
    let requested = usize::try_from(requested.max(1)).unwrap_or(usize::MAX);
    requested.min(task_count.max(1))
}

/// Runs `tasks` with at most `concurrency` in flight, preserving input order.
///
/// A `concurrency` of zero or less behaves as 1.
pub async fn run_pool<I, Fut, T, E>(tasks: I, concurrency: i64) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    let slots: Vec<Mutex<Option<Fut>>> = tasks
        .into_iter()
        .map(|task| Mutex::new(Some(task)))
        .collect();
    let task_count = slots.len();
    if task_count == 0 {
        return Ok(Vec::new());
    }

    let results: Vec<OnceLock<T>> = (0..task_count).map(|_| OnceLock::new()).collect();
    let next = AtomicUsize::new(0);

    {
        let (slots, results, next) = (&slots, &results, &next);
        let workers = (0..effective_concurrency(concurrency, task_count)).map(|_| async move {
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= task_count {
                    break;
                }
                let task = slots[index]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                let Some(task) = task else {
                    continue;
                };
                let value = task.await?;
                // Each index is claimed by exactly one worker.
                let _ = results[index].set(value);
            }
            Ok::<(), E>(())
        });
        try_join_all(workers).await?;
    }

    Ok(results
        .into_iter()
        .filter_map(OnceLock::into_inner)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Tracks how many tasks are running at once.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl InFlight {
        async fn run<T>(&self, delay_ms: u64, value: T) -> Result<T, String> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[test]
    fn test_effective_concurrency_clamps() {
        assert_eq!(effective_concurrency(3, 7), 3);
        assert_eq!(effective_concurrency(0, 7), 1);
        assert_eq!(effective_concurrency(-4, 7), 1);
        assert_eq!(effective_concurrency(20, 7), 7);
        assert_eq!(effective_concurrency(5, 0), 1);
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let tracker = InFlight::default();
        // Earlier tasks sleep longer, so they finish last.
        let tasks = (0..7u64).map(|i| tracker.run((7 - i) * 15, i));

        let results = run_pool(tasks, 3).await.expect("all tasks succeed");

        assert_eq!(results, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(tracker.max.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_positive_concurrency_runs_one_at_a_time() {
        for requested in [0, -1, -100] {
            let tracker = InFlight::default();
            let tasks = (0..4u64).map(|i| tracker.run(5, i));

            let results = run_pool(tasks, requested).await.expect("all tasks succeed");

            assert_eq!(results, vec![0, 1, 2, 3]);
            assert_eq!(tracker.max.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_concurrency_above_task_count() {
        let tracker = InFlight::default();
        let tasks = (0..2u64).map(|i| tracker.run(10, i * 10));

        let results = run_pool(tasks, 16).await.expect("all tasks succeed");

        assert_eq!(results, vec![0, 10]);
        assert_eq!(tracker.max.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_error_aborts_the_pool() {
        let started = AtomicUsize::new(0);
        let started = &started;
        let tasks = (0..6u32).map(|i| async move {
            started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if i == 1 {
                Err(format!("task {} failed", i))
            } else {
                Ok(i)
            }
        });

        let result = run_pool(tasks, 1).await;

        assert_eq!(result, Err("task 1 failed".to_string()));
        // With one worker, nothing after the failing task was started.
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let tasks: Vec<std::future::Ready<Result<u8, String>>> = Vec::new();
        let results = run_pool(tasks, 4).await.expect("empty pool succeeds");
        assert!(results.is_empty());
    }
}
