//! Lambda Testkit - ordered, parallel and parameterized test execution
//!
//! Runs the test methods of a [`TestClass`](models::TestClass) in three
//! phases: at most one first test, then the normal tests (in parallel or in
//! sequence), then at most one last test. Parameterized methods expand into
//! one execution unit per argument tuple, gathered from inline CSV rows, data
//! files, provider types, named provider methods and lambda fields.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use lambda_testkit::config::RunnerConfig;
//! use lambda_testkit::executor::TestRunner;
//! use lambda_testkit::models::{MethodDecl, TestClass};
//! use lambda_testkit::notify::TracingListener;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let class = TestClass::new("Smoke")
//!     .method(MethodDecl::blocking("setup", |_| Ok(())).first())
//!     .method(MethodDecl::blocking("works", |_| Ok(())));
//!
//! let summary = TestRunner::new(RunnerConfig::default())
//!     .run(&class, Arc::new(TracingListener))
//!     .await?;
//! assert!(summary.is_all_passed());
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod demo;
pub mod error;
pub mod executor;
pub mod models;
pub mod notify;
pub mod output;
pub mod params;
pub mod utils;

#[doc(hidden)]
pub use serde_json as __serde_json;

pub use classify::{classify, Classifier, SchedulingPlan};
pub use error::{expect_that, AssertionFailure, ConfigurationError};
pub use executor::{Scheduler, SchedulerState, TestRunner};
pub use models::{MethodDecl, ParameterTuple, RunSummary, TestClass};
pub use notify::RunListener;
