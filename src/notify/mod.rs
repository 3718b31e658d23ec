//! Unit event notification
//!
//! The scheduler and its units report progress through a [`RunListener`].
//! Units of a parallel batch call the listener concurrently, so every
//! implementation must be safe to share across threads.

use std::sync::Mutex;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::ConfigurationError;
use crate::models::{MethodId, UnitDescription};

/// Receives unit lifecycle events.
pub trait RunListener: Send + Sync {
    fn unit_started(&self, _unit: &UnitDescription) {}

    fn unit_succeeded(&self, _unit: &UnitDescription) {}

    /// The body raised an assertion failure or panicked.
    fn unit_failed(&self, _unit: &UnitDescription, _cause: &str) {}

    /// The body returned an error other than an assertion failure.
    fn unit_errored(&self, _unit: &UnitDescription, _cause: &str) {}

    fn unit_ignored(&self, _unit: &UnitDescription) {}

    /// A method could not be scheduled; none of its units ran.
    fn configuration_failed(&self, _method: &MethodId, _error: &ConfigurationError) {}
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentListener;

impl RunListener for SilentListener {}

/// Logs every event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingListener;

impl RunListener for TracingListener {
    fn unit_started(&self, unit: &UnitDescription) {
        info!("▶ {}", unit);
    }

    fn unit_succeeded(&self, unit: &UnitDescription) {
        info!("✓ {}", unit);
    }

    fn unit_failed(&self, unit: &UnitDescription, cause: &str) {
        warn!("✗ {}: {}", unit, cause);
    }

    fn unit_errored(&self, unit: &UnitDescription, cause: &str) {
        error!("! {}: {}", unit, cause);
    }

    fn unit_ignored(&self, unit: &UnitDescription) {
        info!("○ {} (ignored)", unit);
    }

    fn configuration_failed(&self, method: &MethodId, error: &ConfigurationError) {
        error!("⚙ {}: {}", method, error);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Started,
    Succeeded,
    Failed(String),
    Errored(String),
    Ignored,
    Configuration(String),
}

impl EventKind {
    /// Whether the event ends a unit.
    pub fn is_completion(&self) -> bool {
        !matches!(self, EventKind::Started)
    }
}

#[derive(Clone, Debug)]
pub struct RecordedEvent {
    /// Global order of arrival, starting at 0.
    pub seq: usize,
    pub at: Instant,
    pub kind: EventKind,
    /// Rendered unit description, or the method id for configuration events.
    pub unit: String,
    pub method: MethodId,
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, method: &MethodId, unit: String, kind: EventKind) {
        // Sequence number and push happen under one lock.
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let seq = events.len();
        events.push(RecordedEvent {
            seq,
            at: Instant::now(),
            kind,
            unit,
            method: method.clone(),
        });
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Events of one method, in arrival order.
    pub fn events_for(&self, method_name: &str) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.method.name == method_name)
            .collect()
    }

    pub fn completions(&self) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.is_completion())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RunListener for RecordingListener {
    fn unit_started(&self, unit: &UnitDescription) {
        self.record(&unit.method, unit.to_string(), EventKind::Started);
    }

    fn unit_succeeded(&self, unit: &UnitDescription) {
        self.record(&unit.method, unit.to_string(), EventKind::Succeeded);
    }

    fn unit_failed(&self, unit: &UnitDescription, cause: &str) {
        self.record(
            &unit.method,
            unit.to_string(),
            EventKind::Failed(cause.to_string()),
        );
    }

    fn unit_errored(&self, unit: &UnitDescription, cause: &str) {
        self.record(
            &unit.method,
            unit.to_string(),
            EventKind::Errored(cause.to_string()),
        );
    }

    fn unit_ignored(&self, unit: &UnitDescription) {
        self.record(&unit.method, unit.to_string(), EventKind::Ignored);
    }

    fn configuration_failed(&self, method: &MethodId, error: &ConfigurationError) {
        self.record(
            method,
            method.to_string(),
            EventKind::Configuration(error.to_string()),
        );
    }
}
