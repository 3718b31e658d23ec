//! Test execution runner
//!
//! Classifies a test class under the runner configuration and drives the
//! resulting plan.

use std::sync::Arc;
use tracing::{error, info};

use super::scheduler::Scheduler;
use crate::classify::{Classifier, Filter, Sorter};
use crate::config::RunnerConfig;
use crate::error::ConfigurationError;
use crate::models::{RunSummary, TestClass};
use crate::notify::RunListener;
use crate::params::ParameterExtractor;

/// Runs test classes
#[derive(Clone, Default)]
pub struct TestRunner {
    config: RunnerConfig,
    filter: Option<Filter>,
    sorter: Option<Sorter>,
    parallel_override: Option<bool>,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sorter(mut self, sorter: Sorter) -> Self {
        self.sorter = Some(sorter);
        self
    }

    /// Force parallel or sequential execution, ignoring class markers.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel_override = Some(parallel);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn classifier(&self) -> Classifier {
        let mut classifier = Classifier::new().with_parallel_default(self.config.parallel_default);
        if let Some(filter) = &self.filter {
            classifier = classifier.with_filter(filter.clone());
        }
        if let Some(sorter) = &self.sorter {
            classifier = classifier.with_sorter(sorter.clone());
        }
        classifier
    }

    /// Run one class. A plan-level configuration error is returned before
    /// any event reaches `listener`.
    pub async fn run(
        &self,
        class: &TestClass,
        listener: Arc<dyn RunListener>,
    ) -> Result<RunSummary, ConfigurationError> {
        let mut plan = self.classifier().classify(class).map_err(|e| {
            error!("{} cannot be scheduled: {}", class.name(), e);
            e
        })?;

        if let Some(parallel) = self.parallel_override {
            plan.parallel = parallel;
        }

        let scheduler = Scheduler::new(plan, ParameterExtractor::new(&self.config.resource_dir))
            .with_max_concurrent(self.config.max_concurrent);
        Ok(scheduler.run(listener).await)
    }

    /// Run classes one after another. Each class gets its own entry, so a
    /// broken class does not stop the rest.
    pub async fn run_classes(
        &self,
        classes: &[TestClass],
        listener: Arc<dyn RunListener>,
    ) -> Vec<Result<RunSummary, ConfigurationError>> {
        info!("Running {} test class(es)", classes.len());

        let mut outcomes = Vec::with_capacity(classes.len());
        for class in classes {
            outcomes.push(self.run(class, listener.clone()).await);
        }

        let passed = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(summary) if summary.is_all_passed()))
            .count();
        info!(
            "Finished {} class(es): {} fully passed",
            outcomes.len(),
            passed
        );
        outcomes
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::classify::{alphabetical, name_filter};
    use crate::models::{MethodDecl, UnitStatus};
    use crate::notify::{EventKind, RecordingListener, SilentListener};
    use tokio_test::assert_ok;

    fn suite() -> TestClass {
        TestClass::new("Suite")
            .method(MethodDecl::blocking("zeta", |_| Ok(())))
            .method(MethodDecl::blocking("alpha", |_| Ok(())))
            .method(MethodDecl::blocking("beta", |_| anyhow::bail!("nope")))
    }

    #[tokio::test]
    async fn test_runner_applies_filter_and_sorter() {
        let listener = Arc::new(RecordingListener::new());
        let runner = TestRunner::new(RunnerConfig::default())
            .with_filter(name_filter("ta"))
            .with_sorter(alphabetical());

        let summary = assert_ok!(runner.run(&suite(), listener.clone()).await);
        let names: Vec<_> = summary
            .results
            .iter()
            .map(|r| r.unit.method.name.as_str())
            .collect();
        assert_eq!(names, vec!["beta", "zeta"]);
        assert_eq!(summary.errors, 1);
        assert!(!summary.parallel);
        assert_eq!(listener.events()[0].kind, EventKind::Started);
    }

    #[tokio::test]
    async fn test_parallel_default_and_override() {
        let config = RunnerConfig {
            parallel_default: true,
            ..Default::default()
        };
        let listener: Arc<dyn RunListener> = Arc::new(SilentListener);

        let summary = assert_ok!(
            TestRunner::new(config.clone())
                .run(&suite(), listener.clone())
                .await
        );
        assert!(summary.parallel);

        let summary = assert_ok!(
            TestRunner::new(config)
                .with_parallel(false)
                .run(&suite(), listener)
                .await
        );
        assert!(!summary.parallel);
    }

    #[tokio::test]
    async fn test_run_classes_isolates_broken_class() {
        let broken = TestClass::new("Broken")
            .method(MethodDecl::blocking("x", |_| Ok(())).last())
            .method(MethodDecl::blocking("y", |_| Ok(())).last());

        let outcomes = TestRunner::default()
            .run_classes(&[broken, suite()], Arc::new(SilentListener))
            .await;

        assert!(matches!(
            outcomes[0],
            Err(ConfigurationError::MultipleLast { .. })
        ));
        let summary = outcomes[1].as_ref().unwrap();
        assert_eq!(
            summary.results.iter().filter(|r| r.status == UnitStatus::Pass).count(),
            2
        );
    }
}
