//! Invocation adapter
//!
//! Binds one argument tuple to a test method and runs the body, turning
//! every outcome into exactly one completion event.

use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::debug;

use crate::error::{AssertionFailure, ConfigurationError};
use crate::models::{
    Arguments, ParameterTuple, TestBody, TestMethod, UnitDescription, UnitResult,
};
use crate::notify::RunListener;
use crate::utils::Timer;

/// One schedulable invocation of a test method.
pub struct ExecutionUnit {
    method: Arc<TestMethod>,
    description: UnitDescription,
    arguments: Arguments,
}

/// Bind `tuple` (with its position in the resolved list) to `method`.
///
/// A missing tuple binds as an empty one, so a method declaring
/// parameters without any source fails the arity check.
pub fn make_unit(
    method: &Arc<TestMethod>,
    tuple: Option<(usize, ParameterTuple)>,
) -> Result<ExecutionUnit, ConfigurationError> {
    let (description, values) = match tuple {
        Some((index, tuple)) => (
            UnitDescription::parameterized(method.id.clone(), method.role, index, tuple.to_string()),
            tuple,
        ),
        None => (
            UnitDescription::plain(method.id.clone(), method.role),
            ParameterTuple::default(),
        ),
    };

    if values.len() != method.arity() {
        return Err(ConfigurationError::ArityMismatch {
            method: method.id.to_string(),
            expected: method.arity(),
            actual: values.len(),
            tuple: values.to_string(),
        });
    }

    let mut bound = Vec::with_capacity(values.len());
    for (position, (kind, value)) in method.params.iter().zip(values.into_values()).enumerate() {
        let rendered = value.to_string();
        let coerced = kind
            .coerce(value)
            .ok_or_else(|| ConfigurationError::Coercion {
                method: method.id.to_string(),
                position,
                expected: kind.name().to_string(),
                value: rendered,
            })?;
        bound.push(coerced);
    }

    Ok(ExecutionUnit {
        method: method.clone(),
        description,
        arguments: Arguments::new(bound),
    })
}

impl ExecutionUnit {
    pub fn description(&self) -> &UnitDescription {
        &self.description
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Run the body and report exactly one start and one completion event.
    ///
    /// Never panics and never returns an error: a panicking body becomes a
    /// failure, the same as an [`AssertionFailure`].
    pub async fn run(self, listener: &dyn RunListener) -> UnitResult {
        let ExecutionUnit {
            method,
            description,
            arguments,
        } = self;

        listener.unit_started(&description);
        debug!("Running {}", description);
        let timer = Timer::start(description.to_string());

        let outcome = match &method.body {
            TestBody::Async(body) => {
                let body = body.clone();
                tokio::spawn(async move { body(arguments).await }).await
            }
            TestBody::Blocking(body) => {
                let body = body.clone();
                tokio::task::spawn_blocking(move || body(arguments)).await
            }
        };
        let duration = timer.stop();

        match outcome {
            Ok(Ok(())) => {
                listener.unit_succeeded(&description);
                UnitResult::pass(description, duration)
            }
            Ok(Err(e)) if is_assertion(&e) => {
                let cause = format!("{e:#}");
                listener.unit_failed(&description, &cause);
                UnitResult::fail(description, duration, cause)
            }
            Ok(Err(e)) => {
                let cause = format!("{e:#}");
                listener.unit_errored(&description, &cause);
                UnitResult::error(description, duration, cause)
            }
            Err(join) => {
                let cause = join_failure(join);
                listener.unit_failed(&description, &cause);
                UnitResult::fail(description, duration, cause)
            }
        }
    }
}

fn is_assertion(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<AssertionFailure>())
}

/// Describe a task that did not finish normally.
pub(crate) fn join_failure(join: JoinError) -> String {
    if join.is_panic() {
        format!("panicked: {}", panic_message(join.into_panic()))
    } else {
        "cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::expect_that;
    use crate::models::{MethodDecl, MethodId, ParamKind, Role};
    use crate::notify::{EventKind, RecordingListener};
    use crate::tuple;
    use serde_json::json;

    fn method(decl: MethodDecl) -> Arc<TestMethod> {
        Arc::new(TestMethod {
            id: MethodId::new("Suite", &decl.name),
            role: Role::Normal,
            params: decl.params.clone(),
            ignored: decl.ignored,
            body: decl.body,
            parameters: None,
        })
    }

    #[test]
    fn test_arity_mismatch() {
        let m = method(MethodDecl::blocking("sum", |_| Ok(())).arity(3));
        let err = make_unit(&m, Some((0, tuple!["1", "2"]))).err().unwrap();
        assert_eq!(
            err,
            ConfigurationError::ArityMismatch {
                method: "Suite#sum".to_string(),
                expected: 3,
                actual: 2,
                tuple: "(1, 2)".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_tuple_for_parameterized_method() {
        let m = method(MethodDecl::blocking("sum", |_| Ok(())).arity(1));
        assert!(matches!(
            make_unit(&m, None),
            Err(ConfigurationError::ArityMismatch { expected: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn test_coercion() {
        let m = method(
            MethodDecl::blocking("greet", |_| Ok(())).params([
                ParamKind::Int,
                ParamKind::Str,
                ParamKind::Bool,
            ]),
        );
        let unit = make_unit(&m, Some((1, tuple!["2", "Hi", "false"]))).unwrap();
        assert_eq!(unit.arguments().values(), &[json!(2), json!("Hi"), json!(false)]);
        assert_eq!(unit.description().to_string(), "Suite#greet[1] (2, Hi, false)");

        let err = make_unit(&m, Some((0, tuple!["two", "Hi", "false"]))).err().unwrap();
        assert!(matches!(err, ConfigurationError::Coercion { position: 0, .. }));
    }

    #[tokio::test]
    async fn test_outcomes() {
        let listener = RecordingListener::new();

        let pass = method(MethodDecl::test("pass", |_| async { Ok(()) }));
        let fail = method(MethodDecl::blocking("fail", |_| {
            expect_that(1 + 1 == 3, "arithmetic")?;
            Ok(())
        }));
        let error = method(MethodDecl::test("error", |_| async {
            Err(anyhow::anyhow!("connection refused"))
        }));
        let panic = method(MethodDecl::blocking("panic", |_| panic!("boom")));

        let mut statuses = Vec::new();
        for m in [&pass, &fail, &error, &panic] {
            let unit = make_unit(m, None).unwrap();
            statuses.push(unit.run(&listener).await);
        }

        assert!(statuses[0].status.is_success());
        assert_eq!(statuses[1].message.as_deref(), Some("arithmetic"));
        assert_eq!(statuses[2].status, crate::models::UnitStatus::Error);
        assert_eq!(statuses[3].status, crate::models::UnitStatus::Fail);
        assert_eq!(statuses[3].message.as_deref(), Some("panicked: boom"));

        let kinds: Vec<_> = listener.completions().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Succeeded,
                EventKind::Failed("arithmetic".to_string()),
                EventKind::Errored("connection refused".to_string()),
                EventKind::Failed("panicked: boom".to_string()),
            ]
        );
        assert_eq!(listener.len(), 8);
    }

    #[tokio::test]
    async fn test_async_body_panic_is_contained() {
        let listener = RecordingListener::new();
        let m = method(MethodDecl::test("boom", |_| async {
            let explode = true;
            if explode {
                panic!("async boom");
            }
            Ok(())
        }));
        let result = make_unit(&m, None).unwrap().run(&listener).await;
        assert_eq!(result.status, crate::models::UnitStatus::Fail);
        assert!(result.message.unwrap().contains("async boom"));
    }

    #[tokio::test]
    async fn test_arguments_reach_body() {
        let listener = RecordingListener::new();
        let m = method(
            MethodDecl::blocking("check", |args| {
                let n: i64 = args.get(0)?;
                expect_that(n == 3, format!("got {n}"))?;
                Ok(())
            })
            .params([ParamKind::Int]),
        );
        let result = make_unit(&m, Some((0, tuple!["3"]))).unwrap().run(&listener).await;
        assert!(result.status.is_success());
    }
}
