//! Ordered scheduling
//!
//! Drives one [`SchedulingPlan`] through
//! `Idle -> RunningFirst -> RunningNormal -> RunningLast -> Completed`.
//! The first method finishes before any normal unit starts, and the last
//! method starts only after every normal unit has completed, whether the
//! normal batch runs sequentially or in parallel.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::parallel::ParallelExecutor;
use super::unit::{join_failure, make_unit, ExecutionUnit};
use crate::classify::SchedulingPlan;
use crate::error::ConfigurationError;
use crate::models::{RunSummary, TestMethod, UnitDescription, UnitResult};
use crate::notify::RunListener;
use crate::params::ParameterExtractor;
use crate::utils::Stopwatch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    RunningFirst,
    RunningNormal,
    RunningLast,
    Completed,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "idle"),
            SchedulerState::RunningFirst => write!(f, "running-first"),
            SchedulerState::RunningNormal => write!(f, "running-normal"),
            SchedulerState::RunningLast => write!(f, "running-last"),
            SchedulerState::Completed => write!(f, "completed"),
        }
    }
}

/// Either the units of a method, or the single result that replaces them.
enum Prepared {
    Units(Vec<ExecutionUnit>),
    Skipped(UnitResult),
}

/// Single-use executor of one plan.
pub struct Scheduler {
    plan: SchedulingPlan,
    extractor: ParameterExtractor,
    executor: ParallelExecutor,
    state: SchedulerState,
    phases: Vec<SchedulerState>,
}

impl Scheduler {
    pub fn new(plan: SchedulingPlan, extractor: ParameterExtractor) -> Self {
        Self {
            plan,
            extractor,
            executor: ParallelExecutor::default(),
            state: SchedulerState::Idle,
            phases: vec![SchedulerState::Idle],
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.executor = ParallelExecutor::new(max_concurrent);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!("{}: {} -> {}", self.plan.class, self.state, next);
        self.state = next;
        self.phases.push(next);
    }

    /// Run every phase to completion. Consumes the scheduler; a plan is
    /// never run twice.
    pub async fn run(mut self, listener: Arc<dyn RunListener>) -> RunSummary {
        let started_at = Utc::now();
        let mut stopwatch = Stopwatch::new();
        let mut results = Vec::new();

        info!(
            "Starting {} ({} method(s), {})",
            self.plan.class,
            self.plan.method_count(),
            if self.plan.parallel { "parallel" } else { "sequential" }
        );

        if let Some(first) = self.plan.first.clone() {
            self.transition(SchedulerState::RunningFirst);
            results.extend(self.run_synchronously(&first, listener.as_ref()).await);
            stopwatch.lap(SchedulerState::RunningFirst.to_string());
        }

        if !self.plan.normal.is_empty() {
            self.transition(SchedulerState::RunningNormal);
            results.extend(self.run_normal(listener.clone()).await);
            stopwatch.lap(SchedulerState::RunningNormal.to_string());
        }

        if let Some(last) = self.plan.last.clone() {
            self.transition(SchedulerState::RunningLast);
            results.extend(self.run_synchronously(&last, listener.as_ref()).await);
            stopwatch.lap(SchedulerState::RunningLast.to_string());
        }

        self.transition(SchedulerState::Completed);
        debug!("{} phase timings:\n{}", self.plan.class, stopwatch.format());

        let summary = RunSummary::new(
            self.plan.class.clone(),
            self.plan.parallel,
            started_at,
            stopwatch.total_ms(),
            self.phases,
            results,
        );

        info!(
            "{} completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.class,
            summary.duration_ms,
            summary.passed,
            summary.total,
            summary.pass_rate()
        );
        summary
    }

    /// First and last methods: every unit in order, before returning.
    async fn run_synchronously(
        &self,
        method: &Arc<TestMethod>,
        listener: &dyn RunListener,
    ) -> Vec<UnitResult> {
        match self.prepare(method, listener).await {
            Prepared::Units(units) => self.executor.run_sequential(units, listener).await,
            Prepared::Skipped(result) => vec![result],
        }
    }

    async fn run_normal(&self, listener: Arc<dyn RunListener>) -> Vec<UnitResult> {
        let mut skipped = Vec::new();
        let mut units = Vec::new();

        for method in &self.plan.normal {
            match self.prepare(method, listener.as_ref()).await {
                Prepared::Units(prepared) => units.extend(prepared),
                Prepared::Skipped(result) => skipped.push(result),
            }
        }

        debug!(
            "{}: {} normal unit(s) ready, {} method(s) skipped",
            self.plan.class,
            units.len(),
            skipped.len()
        );

        let executed = if self.plan.parallel {
            self.executor.run_parallel(units, listener).await
        } else {
            self.executor.run_sequential(units, listener.as_ref()).await
        };

        skipped.extend(executed);
        skipped
    }

    /// Resolve parameters and bind every unit of `method`. Any
    /// configuration error skips the whole method.
    async fn prepare(&self, method: &Arc<TestMethod>, listener: &dyn RunListener) -> Prepared {
        if method.ignored {
            let unit = UnitDescription::plain(method.id.clone(), method.role);
            listener.unit_ignored(&unit);
            return Prepared::Skipped(UnitResult::ignored(unit));
        }

        match self.bind(method).await {
            Ok(units) => Prepared::Units(units),
            Err(error) => {
                warn!("Skipping {}: {}", method.id, error);
                listener.configuration_failed(&method.id, &error);
                Prepared::Skipped(UnitResult::config(
                    UnitDescription::plain(method.id.clone(), method.role),
                    error.to_string(),
                ))
            }
        }
    }

    async fn bind(&self, method: &Arc<TestMethod>) -> Result<Vec<ExecutionUnit>, ConfigurationError> {
        let table = match &method.parameters {
            None => return Ok(vec![make_unit(method, None)?]),
            Some(Err(error)) => return Err(error.clone()),
            Some(Ok(table)) => table.clone(),
        };

        // Providers and pull functions are arbitrary user code.
        let extractor = self.extractor.clone();
        let tuples = tokio::task::spawn_blocking(move || extractor.resolve(&table))
            .await
            .map_err(|join| ConfigurationError::ResolutionAborted {
                method: method.id.to_string(),
                reason: join_failure(join),
            })??;

        tuples
            .into_iter()
            .enumerate()
            .map(|(index, tuple)| make_unit(method, Some((index, tuple))))
            .collect()
    }
}
