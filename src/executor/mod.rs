//! Test execution engine
//!
//! Invocation adapter, bounded parallel executor, the ordered scheduler,
//! and the runner tying them to configuration.

mod parallel;
mod runner;
mod scheduler;
mod unit;

pub use parallel::ParallelExecutor;
pub use runner::TestRunner;
pub use scheduler::{Scheduler, SchedulerState};
pub use unit::{make_unit, ExecutionUnit};
