//! Unit outcome models
//!
//! Defines unit descriptions, per-unit results, and the per-class run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::method::{MethodId, Role};
use crate::executor::SchedulerState;

/// Identifies one schedulable unit: a method plus, for parameterized
/// methods, the position and rendering of its tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitDescription {
    pub method: MethodId,
    pub role: Role,
    pub index: Option<usize>,
    pub arguments: Option<String>,
}

impl UnitDescription {
    pub fn plain(method: MethodId, role: Role) -> Self {
        Self {
            method,
            role,
            index: None,
            arguments: None,
        }
    }

    pub fn parameterized(
        method: MethodId,
        role: Role,
        index: usize,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            method,
            role,
            index: Some(index),
            arguments: Some(arguments.into()),
        }
    }
}

impl fmt::Display for UnitDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method)?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        if let Some(args) = &self.arguments {
            write!(f, " {args}")?;
        }
        Ok(())
    }
}

/// Unit execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Pass,
    Fail,
    Error,
    Ignored,
    /// The method never ran because its declaration is invalid.
    Config,
}

impl UnitStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitStatus::Pass => "✓",
            UnitStatus::Fail => "✗",
            UnitStatus::Error => "!",
            UnitStatus::Ignored => "○",
            UnitStatus::Config => "⚙",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UnitStatus::Pass | UnitStatus::Ignored)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Pass => write!(f, "PASS"),
            UnitStatus::Fail => write!(f, "FAIL"),
            UnitStatus::Error => write!(f, "ERROR"),
            UnitStatus::Ignored => write!(f, "IGNORED"),
            UnitStatus::Config => write!(f, "CONFIG"),
        }
    }
}

/// Result of a single unit, or of a method that could not be scheduled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitResult {
    pub unit: UnitDescription,
    pub status: UnitStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl UnitResult {
    pub fn pass(unit: UnitDescription, duration_ms: u64) -> Self {
        Self {
            unit,
            status: UnitStatus::Pass,
            duration_ms,
            message: None,
        }
    }

    pub fn fail(unit: UnitDescription, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            unit,
            status: UnitStatus::Fail,
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn error(unit: UnitDescription, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            unit,
            status: UnitStatus::Error,
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn ignored(unit: UnitDescription) -> Self {
        Self {
            unit,
            status: UnitStatus::Ignored,
            duration_ms: 0,
            message: None,
        }
    }

    pub fn config(unit: UnitDescription, message: impl Into<String>) -> Self {
        Self {
            unit,
            status: UnitStatus::Config,
            duration_ms: 0,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for UnitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.unit,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one class run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub class: String,
    pub parallel: bool,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub ignored: usize,
    pub config_failures: usize,
    pub duration_ms: u64,
    pub phases: Vec<SchedulerState>,
    pub results: Vec<UnitResult>,
}

impl RunSummary {
    pub fn new(
        class: impl Into<String>,
        parallel: bool,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        phases: Vec<SchedulerState>,
        results: Vec<UnitResult>,
    ) -> Self {
        let count = |status: UnitStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            class: class.into(),
            parallel,
            started_at,
            total: results.len(),
            passed: count(UnitStatus::Pass),
            failed: count(UnitStatus::Fail),
            errors: count(UnitStatus::Error),
            ignored: count(UnitStatus::Ignored),
            config_failures: count(UnitStatus::Config),
            duration_ms,
            phases,
            results,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        let executed = self.total - self.ignored;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.results.iter().all(|r| r.status.is_success())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.parallel { "parallel" } else { "sequential" };
        writeln!(f, "{} ({mode})", self.class)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Ignored: {} | Config: {}",
            self.total, self.passed, self.failed, self.errors, self.ignored, self.config_failures
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.duration_ms
        )
    }
}
