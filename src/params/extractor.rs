//! Parameter extraction
//!
//! Walks a method's lookup table in stage order and merges every source's
//! tuples into one list.

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::file::read_tuples;
use super::lookup::{Binding, LookupTable};
use super::normalize::normalize;
use crate::error::ConfigurationError;
use crate::models::ParameterTuple;

/// Resolves parameter tuples. Holds no mutable state; each call is
/// independent.
#[derive(Clone, Debug)]
pub struct ParameterExtractor {
    resource_dir: PathBuf,
}

impl ParameterExtractor {
    /// `resource_dir` is the root `classpath:` locators resolve against.
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
        }
    }

    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Merge all sources of `table` into an ordered tuple list.
    ///
    /// Fails when any source is broken, or when every source together
    /// produced nothing.
    pub fn resolve(&self, table: &LookupTable) -> Result<Vec<ParameterTuple>, ConfigurationError> {
        let mut tuples = Vec::new();

        for binding in table.bindings() {
            let before = tuples.len();

            match binding {
                Binding::Inline(tuple) => tuples.push(tuple.clone()),
                Binding::File {
                    locator,
                    target,
                    mapper,
                } => {
                    tuples.extend(read_tuples(
                        locator,
                        target,
                        mapper.as_ref(),
                        &self.resource_dir,
                    )?);
                }
                Binding::Provider {
                    declaring_type,
                    method,
                    call,
                    ..
                } => {
                    let output = call().map_err(|e| ConfigurationError::ProviderInvocation {
                        method: method.clone(),
                        declaring_type: declaring_type.clone(),
                        reason: format!("{e:#}"),
                    })?;
                    tuples.extend(normalize(output, method, declaring_type)?);
                }
                Binding::Pull { factory, .. } => {
                    // A `for` loop stops at the first `None` and never pulls again.
                    for tuple in factory() {
                        tuples.push(tuple);
                    }
                }
            }

            trace!(
                "{}: {:?} contributed {} tuple(s)",
                table.method(),
                binding,
                tuples.len() - before
            );
        }

        if tuples.is_empty() {
            return Err(ConfigurationError::EmptyParameters {
                method: table.method().to_string(),
            });
        }

        debug!("Resolved {} tuple(s) for {}", tuples.len(), table.method());
        Ok(tuples)
    }
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new("resources")
    }
}
