//! Unit execution
//!
//! Runs a batch of units either one at a time or concurrently. The
//! concurrent path returns only after every submitted unit has completed.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::unit::{join_failure, ExecutionUnit};
use crate::models::UnitResult;
use crate::notify::RunListener;
use crate::utils::Timer;

/// Bounded concurrent executor
#[derive(Clone, Debug)]
pub struct ParallelExecutor {
    max_concurrent: usize,
}

impl ParallelExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Submit every unit, then wait for all of them.
    ///
    /// Results come back in submission order.
    pub async fn run_parallel(
        &self,
        units: Vec<ExecutionUnit>,
        listener: Arc<dyn RunListener>,
    ) -> Vec<UnitResult> {
        if units.is_empty() {
            return Vec::new();
        }

        info!(
            "Running {} unit(s) in parallel (max {} concurrent)",
            units.len(),
            self.max_concurrent
        );
        let timer = Timer::start("parallel batch");
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut descriptions = Vec::with_capacity(units.len());
        let mut handles = Vec::with_capacity(units.len());

        for unit in units {
            let semaphore = semaphore.clone();
            let listener = listener.clone();
            descriptions.push(unit.description().clone());

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                unit.run(listener.as_ref()).await
            }));
        }

        let results: Vec<UnitResult> = join_all(handles)
            .await
            .into_iter()
            .zip(descriptions)
            .map(|(joined, description)| match joined {
                Ok(result) => result,
                Err(join) => {
                    let cause = join_failure(join);
                    listener.unit_errored(&description, &cause);
                    UnitResult::error(description, 0, cause)
                }
            })
            .collect();

        debug!(
            "Parallel batch of {} finished in {}ms",
            results.len(),
            timer.stop()
        );
        results
    }

    /// Run units strictly one after another, in the given order.
    pub async fn run_sequential(
        &self,
        units: Vec<ExecutionUnit>,
        listener: &dyn RunListener,
    ) -> Vec<UnitResult> {
        let mut results = Vec::with_capacity(units.len());
        for unit in units {
            results.push(unit.run(listener).await);
        }
        results
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::executor::make_unit;
    use crate::models::{MethodDecl, MethodId, Role, TestMethod, UnitStatus};
    use crate::notify::RecordingListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn units_tracking(
        count: usize,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    ) -> Vec<ExecutionUnit> {
        (0..count)
            .map(|i| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                let decl = MethodDecl::test(format!("t{i}"), move |_| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                });
                let method = Arc::new(TestMethod {
                    id: MethodId::new("Suite", &decl.name),
                    role: Role::Normal,
                    params: Vec::new(),
                    ignored: false,
                    body: decl.body,
                    parameters: None,
                });
                make_unit(&method, None).ok().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_parallel_executor_creation() {
        assert_eq!(ParallelExecutor::new(8).max_concurrent(), 8);
        assert_eq!(ParallelExecutor::new(0).max_concurrent(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let listener = Arc::new(RecordingListener::new());

        let results = ParallelExecutor::new(2)
            .run_parallel(units_tracking(6, in_flight.clone(), peak.clone()), listener.clone())
            .await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.status == UnitStatus::Pass));
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(listener.completions().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_results_keep_submission_order() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let listener = Arc::new(RecordingListener::new());

        let results = ParallelExecutor::new(4)
            .run_parallel(units_tracking(4, in_flight, peak.clone()), listener)
            .await;

        let names: Vec<_> = results.iter().map(|r| r.unit.method.name.as_str()).collect();
        assert_eq!(names, vec!["t0", "t1", "t2", "t3"]);
        assert!(peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_sequential_never_overlaps() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let listener = RecordingListener::new();

        let results = ParallelExecutor::default()
            .run_sequential(units_tracking(3, in_flight, peak.clone()), &listener)
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
