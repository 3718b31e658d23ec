//! Built-in demonstration suites
//!
//! Small test classes exercising ordering, parallelism and every parameter
//! source. The binary runs them; the tests below keep them green.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

use crate::error::{expect_that, AssertionFailure};
use crate::models::{
    FileParameters, LambdaField, MethodDecl, ParamKind, ParameterRecord, ProviderOutput,
    ProviderType, TestClass,
};
use crate::params::CsvMapper;
use crate::tuple;

/// A named, buildable demonstration class.
#[derive(Clone, Copy)]
pub struct Suite {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> TestClass,
}

impl Suite {
    pub fn build(&self) -> TestClass {
        (self.build)()
    }
}

pub fn all() -> Vec<Suite> {
    vec![
        Suite {
            name: "ordering",
            description: "first and last tests around four parallel tests",
            build: ordering_suite,
        },
        Suite {
            name: "parameterized",
            description: "every parameter source, merged in order",
            build: parameterized_suite,
        },
    ]
}

pub fn find(name: &str) -> Option<Suite> {
    all().into_iter().find(|s| s.name == name)
}

/// Four normal tests that each sleep, bracketed by a first test that
/// expects nothing to have run and a last test that expects all four.
pub fn ordering_suite() -> TestClass {
    let done: Arc<Mutex<HashSet<u64>>> = Arc::new(Mutex::new(HashSet::new()));

    let before = {
        let done = done.clone();
        MethodDecl::blocking("before", move |_| {
            let count = done.lock().map_err(|_| anyhow::anyhow!("lock poisoned"))?.len();
            expect_that(count == 0, format!("expected no tests run, found {count}"))?;
            Ok(())
        })
        .first()
    };

    let mut class = TestClass::new("ParallelOrdering").parallel(true).method(before);

    for n in 1..=4u64 {
        let done = done.clone();
        class = class.method(MethodDecl::test(format!("test{n}"), move |_| {
            let done = done.clone();
            async move {
                trace!("test{} starting", n);
                tokio::time::sleep(Duration::from_millis(50 * n)).await;
                let fresh = done
                    .lock()
                    .map_err(|_| anyhow::anyhow!("lock poisoned"))?
                    .insert(n);
                expect_that(fresh, format!("test{n} ran twice"))?;
                Ok(())
            }
        }));
    }

    class.method(
        MethodDecl::blocking("after", move |_| {
            let count = done.lock().map_err(|_| anyhow::anyhow!("lock poisoned"))?.len();
            expect_that(count == 4, format!("expected 4 tests run, found {count}"))?;
            Ok(())
        })
        .last(),
    )
}

fn string_pairs(pairs: &[(&str, &str)]) -> ProviderOutput {
    ProviderOutput::tuples(
        pairs
            .iter()
            .map(|(a, b)| tuple![*a, *b])
            .collect::<Vec<_>>(),
    )
}

/// Provider type with its own `provide*` methods and an inherited one.
fn word_pairs() -> Arc<ProviderType> {
    let base = Arc::new(
        ProviderType::new("BaseWordPairs")
            .static_method("provideMixedCaseStrings", || {
                Ok(string_pairs(&[("Stone", "notes")]))
            }),
    );
    Arc::new(
        ProviderType::new("WordPairs")
            .extends(base)
            .static_method("provideUpperCaseStrings", || {
                Ok(string_pairs(&[("ONE", "NONE"), ("TWO", "TWOFLOUR")]))
            })
            .static_method("provideLowerCaseStrings", || {
                Ok(string_pairs(&[
                    ("three", "her"),
                    ("four", "flour"),
                    ("five", "alive"),
                ]))
            }),
    )
}

fn common_chars(first: &str, second: &str) -> usize {
    let left: HashSet<char> = first.chars().collect();
    let right: HashSet<char> = second.chars().collect();
    left.intersection(&right).count()
}

/// Exercises inline rows, a file source, a provider class hierarchy,
/// explicit and derived named methods, and a lazy pull field.
pub fn parameterized_suite() -> TestClass {
    let scope = ProviderType::new("Parameterized")
        .instance_method("upcomingTimes", || {
            let now = Utc::now();
            Ok(ProviderOutput::scalars(vec![
                json!((now + ChronoDuration::minutes(30)).to_rfc3339()),
                json!((now + ChronoDuration::days(1)).to_rfc3339()),
                json!((now + ChronoDuration::hours(3)).to_rfc3339()),
            ]))
        })
        .instance_method("parametersForParityMatches", || {
            Ok(ProviderOutput::array(
                (1..10).map(|i| vec![json!(i), json!(i % 2 == 0)]).collect(),
            ))
        });

    let squares = LambdaField::pull("squares", || {
        let mut n = 0i64;
        move || {
            n += 1;
            (n <= 5).then(|| tuple![n, n * n])
        }
    });

    TestClass::new("Parameterized")
        .parallel(false)
        .scope(scope)
        .field(squares)
        .method(MethodDecl::blocking("ignoredFirst", |_| Ok(())).first().ignored())
        .method(
            MethodDecl::blocking("greetings", |args| {
                let number: i64 = args.get(0)?;
                let greeting: String = args.get(1)?;
                let truth: bool = args.get(2)?;
                expect_that(number < 3, "number < 3")?;
                expect_that(greeting.starts_with('H'), "greeting starts with 'H'")?;
                expect_that(truth || greeting.len() < 3, "truth or short greeting")?;
                Ok(())
            })
            .params([ParamKind::Int, ParamKind::Str, ParamKind::Bool])
            .rows(["1, Hello, true", "2, Hi, false"])
            .file(FileParameters::new(
                "classpath:greetings.csv",
                CsvMapper::new().with_headers(),
            )),
        )
        .method(
            MethodDecl::blocking("futureTimes", |args| {
                let raw: String = args.get(0)?;
                let time = DateTime::parse_from_rfc3339(&raw)?;
                expect_that(time > Utc::now(), format!("{raw} is not in the future"))?;
                Ok(())
            })
            .params([ParamKind::Str])
            .record(ParameterRecord::new().method("upcomingTimes")),
        )
        .method(
            MethodDecl::blocking("sharedCharacters", |args| {
                let first: String = args.get(0)?;
                let second: String = args.get(1)?;
                let common = common_chars(&first, &second);
                if common < 3 {
                    return Err(AssertionFailure::new(format!(
                        "{first} and {second} share only {common} character(s)"
                    ))
                    .into());
                }
                Ok(())
            })
            .params([ParamKind::Str, ParamKind::Str])
            .record(ParameterRecord::new().source(word_pairs())),
        )
        .method(
            MethodDecl::blocking("parityMatches", |args| {
                let number: i64 = args.get(0)?;
                let even: bool = args.get(1)?;
                expect_that(
                    (number % 2 == 0) == even,
                    format!("{number} even flag should be {}", number % 2 == 0),
                )?;
                Ok(())
            })
            .params([ParamKind::Int, ParamKind::Bool])
            .record(ParameterRecord::new()),
        )
        .method(
            MethodDecl::test("squares", |args| async move {
                let n: i64 = args.get(0)?;
                let square: i64 = args.get(1)?;
                expect_that(n * n == square, format!("{n}² != {square}"))?;
                Ok(())
            })
            .arity(2)
            .record(ParameterRecord::new().lambda_field("squares")),
        )
        .method(MethodDecl::blocking("lastTest", |_| Ok(())).last())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::executor::TestRunner;
    use crate::models::UnitStatus;
    use crate::notify::RecordingListener;
    use std::path::PathBuf;
    use tokio_test::assert_ok;

    fn runner() -> TestRunner {
        TestRunner::new(RunnerConfig {
            resource_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources"),
            max_concurrent: 4,
            ..Default::default()
        })
    }

    #[test]
    fn test_find_suites() {
        assert!(find("ordering").is_some());
        assert!(find("nope").is_none());
        assert_eq!(all().len(), 2);
    }

    #[test]
    fn test_common_chars() {
        assert_eq!(common_chars("three", "her"), 3);
        assert_eq!(common_chars("ab", "cd"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ordering_suite_passes() {
        let listener = Arc::new(RecordingListener::new());
        let summary = assert_ok!(runner().run(&ordering_suite(), listener.clone()).await);
        assert!(summary.is_all_passed(), "{summary}");
        assert_eq!(summary.total, 6);
        assert_eq!(listener.completions().len(), 6);
    }

    #[tokio::test]
    async fn test_parameterized_suite_passes() {
        let listener = Arc::new(RecordingListener::new());
        let summary = assert_ok!(runner().run(&parameterized_suite(), listener).await);
        assert!(summary.is_all_passed(), "{summary}");

        let count = |name: &str| {
            summary
                .results
                .iter()
                .filter(|r| r.unit.method.name == name && r.status == UnitStatus::Pass)
                .count()
        };
        // two inline rows plus two CSV records
        assert_eq!(count("greetings"), 4);
        assert_eq!(count("futureTimes"), 3);
        // five pairs from WordPairs plus one inherited from its base
        assert_eq!(count("sharedCharacters"), 6);
        assert_eq!(count("parityMatches"), 9);
        assert_eq!(count("squares"), 5);
        assert_eq!(summary.ignored, 1);
    }
}
