//! Bounded fan-out with a hard barrier per stage.

use futures::stream::{self, StreamExt};
use tokio::task;

use crate::artifact::Stage;
use crate::error::{AlignError, Result};

/// Run `task_fn` over `tasks` with at most `workers` concurrent executions.
///
/// This is a structured task group: the call returns only once every launched
/// task has finished. Siblings of a failing task are never cancelled and
/// whatever artifacts they produced remain on disk; all per-task failures are
/// aggregated into a single [`AlignError::Stage`]. Results come back in
/// completion order — callers recover identity from the results themselves,
/// never from position.
pub async fn run_stage<T, R, F>(
    stage: Stage,
    tasks: Vec<T>,
    workers: usize,
    task_fn: F,
) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Result<R> + Clone + Send + Sync + 'static,
{
    let total = tasks.len();

    let outcomes: Vec<_> = stream::iter(tasks)
        .map(|item| {
            let task_fn = task_fn.clone();
            async move { task::spawn_blocking(move || task_fn(item)).await }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut results = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(Ok(result)) => results.push(result),
            Ok(Err(err)) => failures.push(err.to_string()),
            Err(join_err) => failures.push(format!("worker panicked: {join_err}")),
        }
    }

    if !failures.is_empty() {
        return Err(AlignError::Stage {
            stage,
            failed: failures.len(),
            total,
            detail: failures.join("; "),
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_tasks_complete() {
        let results = run_stage(Stage::Split, (1..=5).collect(), 2, |band: usize| {
            Ok(band * 10)
        })
        .await
        .unwrap();

        let seen: HashSet<usize> = results.into_iter().collect();
        assert_eq!(seen, HashSet::from([10, 20, 30, 40, 50]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_empty_batch() {
        let results = run_stage(Stage::Split, Vec::<usize>::new(), 4, |band| Ok(band))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrency_never_exceeds_pool_size() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let running_guard = running.clone();
        let peak_guard = peak.clone();
        run_stage(Stage::Warped, (1..=12).collect(), 3, move |_band: usize| {
            let now = running_guard.fetch_add(1, Ordering::SeqCst) + 1;
            peak_guard.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            running_guard.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_barrier_between_stages() {
        let first_ends = Arc::new(Mutex::new(Vec::new()));
        let second_starts = Arc::new(Mutex::new(Vec::new()));

        let ends = first_ends.clone();
        run_stage(Stage::Split, (1..=6).collect(), 3, move |_band: usize| {
            std::thread::sleep(Duration::from_millis(10));
            ends.lock().unwrap().push(Instant::now());
            Ok(())
        })
        .await
        .unwrap();

        let starts = second_starts.clone();
        run_stage(Stage::Warped, (1..=6).collect(), 3, move |_band: usize| {
            starts.lock().unwrap().push(Instant::now());
            Ok(())
        })
        .await
        .unwrap();

        let last_end = *first_ends.lock().unwrap().iter().max().unwrap();
        let first_start = *second_starts.lock().unwrap().iter().min().unwrap();
        assert!(first_start >= last_end);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failures_are_aggregated_and_siblings_finish() {
        let completed = Arc::new(AtomicUsize::new(0));

        let completed_guard = completed.clone();
        let err = run_stage(Stage::Aligned, (1..=4).collect(), 2, move |band: usize| {
            std::thread::sleep(Duration::from_millis(5));
            completed_guard.fetch_add(1, Ordering::SeqCst);
            if band % 2 == 0 {
                Err(AlignError::NoOverlap { band })
            } else {
                Ok(band)
            }
        })
        .await
        .unwrap_err();

        match err {
            AlignError::Stage {
                stage,
                failed,
                total,
                detail,
            } => {
                assert_eq!(stage, Stage::Aligned);
                assert_eq!(failed, 2);
                assert_eq!(total, 4);
                assert!(detail.contains("band 2"));
                assert!(detail.contains("band 4"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Every sibling ran to completion despite the failures.
        assert_eq!(completed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_panicking_task_is_a_stage_failure() {
        let err = run_stage(Stage::Saved, vec![1usize], 1, |_band| -> Result<()> {
            panic!("boom");
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AlignError::Stage { failed: 1, .. }));
    }
}
