//! Error types
//!
//! Configuration errors are structural mistakes found before any unit of the
//! affected method runs. Assertion failures are raised by test bodies.

use thiserror::Error;

/// A declarative mistake detected before execution.
///
/// Plan-level variants abort the whole class; method-level variants abort
/// only the method they name.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("multiple first: {class} declares more than one first test ({})", .methods.join(", "))]
    MultipleFirst { class: String, methods: Vec<String> },

    #[error("multiple last: {class} declares more than one last test ({})", .methods.join(", "))]
    MultipleLast { class: String, methods: Vec<String> },

    #[error("{method} is marked both first and last")]
    FirstAndLast { method: String },

    #[error("no tests remain in {class} after filtering")]
    NoTestsRemain { class: String },

    #[error("parameters source method {method} in {declaring_type} is not declared as static")]
    NonStaticProvider {
        method: String,
        declaring_type: String,
    },

    #[error(
        "unknown file access protocol '{protocol}' in '{locator}'; only 'file' and 'classpath' are supported"
    )]
    UnknownProtocol { locator: String, protocol: String },

    #[error("could not read parameters from {locator}: {reason}")]
    FileRead { locator: String, reason: String },

    #[error("could not map parameters from {locator}: {reason}")]
    Mapping { locator: String, reason: String },

    #[error(
        "return value of {method} in {declaring_type} is neither an array of tuples, a sequence of tuples nor a sequence of scalars"
    )]
    UnrecognizedShape {
        method: String,
        declaring_type: String,
    },

    #[error("cannot invoke parameters source method {method} in {declaring_type}: {reason}")]
    ProviderInvocation {
        method: String,
        declaring_type: String,
        reason: String,
    },

    #[error("{class} has no parameter field named '{field}'")]
    MissingLambdaField { class: String, field: String },

    #[error("{method} takes {expected} argument(s) but tuple {tuple} has {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
        tuple: String,
    },

    #[error("{method}: argument {position} ({value}) cannot be bound as {expected}")]
    Coercion {
        method: String,
        position: usize,
        expected: String,
        value: String,
    },

    #[error("{method} declares parameters but no source produced any")]
    EmptyParameters { method: String },

    #[error("parameter resolution for {method} aborted: {reason}")]
    ResolutionAborted { method: String, reason: String },
}

impl ConfigurationError {
    /// Whether the error invalidates the whole class rather than one method.
    pub fn is_plan_level(&self) -> bool {
        matches!(
            self,
            ConfigurationError::MultipleFirst { .. }
                | ConfigurationError::MultipleLast { .. }
                | ConfigurationError::FirstAndLast { .. }
                | ConfigurationError::NoTestsRemain { .. }
        )
    }
}

/// Raised by a test body when an expectation does not hold.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct AssertionFailure(pub String);

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Fail with an [`AssertionFailure`] unless `condition` holds.
pub fn expect_that(condition: bool, message: impl Into<String>) -> Result<(), AssertionFailure> {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_level_errors() {
        let err = ConfigurationError::MultipleFirst {
            class: "Suite".to_string(),
            methods: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.is_plan_level());
        assert_eq!(
            err.to_string(),
            "multiple first: Suite declares more than one first test (a, b)"
        );

        let err = ConfigurationError::EmptyParameters {
            method: "Suite#check".to_string(),
        };
        assert!(!err.is_plan_level());
    }

    #[test]
    fn test_non_static_message() {
        let err = ConfigurationError::NonStaticProvider {
            method: "provideNumbers".to_string(),
            declaring_type: "Data".to_string(),
        };
        assert!(err.to_string().contains("is not declared as static"));
    }

    #[test]
    fn test_expect_that() {
        assert!(expect_that(true, "fine").is_ok());
        assert_eq!(
            expect_that(false, "broken"),
            Err(AssertionFailure::new("broken"))
        );
    }
}
