//! Parallel execution of declaration trees
//!
//! Fans a list of declarations out into subtests of a context, marking every
//! subtest parallel so that siblings from one call run concurrently.

use tracing::debug;

use super::probe::already_parallel;
use crate::error::{Error, Result};
use crate::host::TestContext;
use crate::models::Declaration;

/// Run `tests` in parallel with each other as subtests of `t`.
///
/// ```ignore
/// partest::parallel(t, &[test1, test2])?;
/// ```
///
/// is equivalent to
///
/// ```ignore
/// t.phase(|| {
///     t.run(test1.name(), |t| { t.parallel(); /* test1 body */ });
///     t.run(test2.name(), |t| { t.parallel(); /* test2 body */ });
/// });
/// ```
///
/// Groups recurse, so a group's children run in parallel with each other one
/// level below the group. Two calls against the same context do not overlap:
/// the subtests of the first call all finish before the second call starts
/// any. Use [`package_parallel`] to also run `t` alongside its own siblings.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if `t` is absent. Nothing is run in that case.
pub fn parallel<'a>(t: impl Into<Option<&'a TestContext>>, tests: &[Declaration]) -> Result<()> {
    let t = t.into().ok_or_else(absent_context)?;

    debug!(test = %t.name(), count = tests.len(), "starting parallel phase");

    t.phase(|| {
        for test in tests {
            let declared = test.clone();
            t.run(test.name(), move |child| {
                child.parallel();
                invoke(child, &declared);
            });
        }
    });

    Ok(())
}

/// Run `tests` in parallel and mark `t` itself parallel with its siblings.
///
/// ```ignore
/// partest::package_parallel(t, &[test1, test2])?;
/// ```
///
/// is equivalent to calling `t.parallel()` followed by
/// [`parallel`]`(t, &[test1, test2])`, except that `t` is only marked if it
/// is not marked already. That makes repeated calls against one context safe.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if `t` is absent, [`Error::HostIncompatible`]
/// if the marker of `t` can no longer be read.
pub fn package_parallel<'a>(
    t: impl Into<Option<&'a TestContext>>,
    tests: &[Declaration],
) -> Result<()> {
    let t = t.into().ok_or_else(absent_context)?;

    if !already_parallel(t)? {
        t.parallel();
    }

    parallel(t, tests)
}

/// Run the body of a declaration inside `t`
pub(crate) fn invoke(t: &TestContext, test: &Declaration) {
    match test {
        Declaration::Leaf { action, .. } => action(t),
        Declaration::Group { children, .. } => {
            if let Err(err) = parallel(t, children) {
                t.error(err.to_string());
            }
        }
    }
}

fn absent_context() -> Error {
    Error::InvalidArgument("argument t can not be absent".to_string())
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::host::Runner;
    use crate::models::{group, test, RunSummary, TestFn};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    const SINGLE: Duration = Duration::from_millis(400);
    const SLACK: Duration = Duration::from_millis(250);

    fn run(tests: &[Declaration]) -> RunSummary {
        Runner::new(RunnerConfig {
            max_parallel: 16,
            ..Default::default()
        })
        .run(tests)
    }

    fn sleeper(name: &str) -> Declaration {
        test(name, |_| thread::sleep(SINGLE))
    }

    fn counter(name: &str, calls: &Arc<AtomicUsize>) -> Declaration {
        let calls = calls.clone();
        test(name, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_absent_context() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tests = [counter("a", &calls)];

        let err = parallel(None::<&TestContext>, &tests).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidArgument("argument t can not be absent".to_string())
        );
        assert_eq!(package_parallel(None::<&TestContext>, &tests), Err(err));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_declarations() {
        let summary = run(&[
            test("Parallel", |t| parallel(t, &[]).unwrap()),
            test("PackageParallel", |t| package_parallel(t, &[]).unwrap()),
        ]);

        assert!(summary.is_all_passed());
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn test_empty_group_runs_nothing() {
        let summary = run(&[test("Outer", |t| {
            parallel(t, &[group("g", [])]).unwrap();
        })]);

        assert!(summary.is_all_passed());
        assert_eq!(summary.total, 2);
        assert!(summary.result("Outer/g").is_some());
    }

    #[test]
    fn test_every_leaf_runs_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = |name: &str| {
            let seen = seen.clone();
            let label = name.to_string();
            test(name, move |_| seen.lock().push(label.clone()))
        };

        let tree = vec![
            record("a"),
            group(
                "g1",
                [
                    record("b"),
                    group("g2", [record("c"), group("g3", [record("d")])]),
                    group("empty", []),
                ],
            ),
            record("e"),
        ];
        let expected: usize = tree.iter().map(Declaration::leaf_count).sum();

        let summary = run(&[
            test("Parallel", {
                let tree = tree.clone();
                move |t| parallel(t, &tree).unwrap()
            }),
            test("PackageParallel", {
                let tree = tree.clone();
                move |t| package_parallel(t, &tree).unwrap()
            }),
        ]);

        assert!(summary.is_all_passed());
        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen.len(), expected * 2);
        assert_eq!(seen, vec!["a", "a", "b", "b", "c", "c", "d", "d", "e", "e"]);
    }

    #[test]
    fn test_subtests_are_named_after_declarations() {
        let summary = run(&[test("Outer", |t| {
            parallel(
                t,
                &[test("x", |_| {}), group("g", [test("y", |_| {}), test("y", |_| {})])],
            )
            .unwrap();
        })]);

        assert!(summary.is_all_passed());
        for name in ["Outer/x", "Outer/g", "Outer/g/y", "Outer/g/y#01"] {
            let result = summary.result(name).unwrap();
            assert!(result.parallel, "{name} should be marked parallel");
        }
    }

    #[test]
    fn test_leaf_failure_is_reported() {
        let summary = run(&[test("Outer", |t| {
            parallel(t, &[test("bad", |t| t.error("nope")), test("good", |_| {})]).unwrap();
        })]);

        assert_eq!(summary.result("Outer/bad").unwrap().output, vec!["nope".to_string()]);
        assert!(summary.result("Outer/good").unwrap().status.is_success());
        assert!(!summary.result("Outer").unwrap().status.is_success());
    }

    #[test]
    fn test_two_tests_run_in_parallel() {
        let start = Instant::now();
        let summary = run(&[test("Outer", |t| {
            parallel(t, &[sleeper("one"), sleeper("two")]).unwrap();
        })]);
        let elapsed = start.elapsed();

        assert!(summary.is_all_passed());
        assert!(elapsed >= SINGLE, "took {elapsed:?}");
        assert!(elapsed < SINGLE + SLACK, "took {elapsed:?}");
    }

    #[test]
    fn test_ten_tests_run_in_parallel() {
        let tests: Vec<_> = (0..10).map(|i| sleeper(&i.to_string())).collect();

        let start = Instant::now();
        let summary = run(&[test("Outer", move |t| parallel(t, &tests).unwrap())]);
        let elapsed = start.elapsed();

        assert!(summary.is_all_passed());
        assert_eq!(summary.total, 11);
        assert!(elapsed >= SINGLE, "took {elapsed:?}");
        assert!(elapsed < SINGLE * 10 / 2, "took {elapsed:?}");
    }

    #[test]
    fn test_group_runs_children_in_parallel() {
        let start = Instant::now();
        let summary = run(&[test("Outer", |t| {
            parallel(t, &[group("g", [sleeper("one"), sleeper("two")])]).unwrap();
        })]);
        let elapsed = start.elapsed();

        assert!(summary.is_all_passed());
        assert!(elapsed < SINGLE + SLACK, "took {elapsed:?}");
    }

    #[test]
    fn test_separate_calls_run_in_sequence() {
        let spans: Arc<Mutex<HashMap<String, (Instant, Instant)>>> = Arc::default();
        let timed = |name: &str| {
            let spans = spans.clone();
            let label = name.to_string();
            test(name, move |_| {
                let begin = Instant::now();
                thread::sleep(SINGLE);
                spans.lock().insert(label.clone(), (begin, Instant::now()));
            })
        };
        let first = [timed("a"), timed("b")];
        let second = [timed("c"), timed("d")];

        let start = Instant::now();
        let summary = run(&[test("Outer", move |t| {
            parallel(t, &first).unwrap();
            parallel(t, &second).unwrap();
        })]);
        let elapsed = start.elapsed();

        assert!(summary.is_all_passed());
        let spans = spans.lock();
        let (a, b, c, d) = (spans["a"], spans["b"], spans["c"], spans["d"]);

        // a and b overlap, c and d overlap
        assert!(a.0 < b.1 && b.0 < a.1);
        assert!(c.0 < d.1 && d.0 < c.1);
        // the first call finished before the second started
        assert!(a.1.max(b.1) <= c.0.min(d.0));

        assert!(elapsed >= SINGLE * 2, "took {elapsed:?}");
        assert!(elapsed < SINGLE * 2 + SLACK, "took {elapsed:?}");
    }

    #[test]
    fn test_sibling_contexts_run_in_sequence() {
        let start = Instant::now();
        let summary = run(&[test("Outer", |t| {
            t.run("first", |t| parallel(t, &[sleeper("one")]).unwrap());
            t.run("second", |t| parallel(t, &[sleeper("two")]).unwrap());
        })]);
        let elapsed = start.elapsed();

        assert!(summary.is_all_passed());
        assert!(elapsed >= SINGLE * 2, "took {elapsed:?}");
        assert!(elapsed < SINGLE * 3, "took {elapsed:?}");
    }

    #[test]
    fn test_package_parallel_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let summary = run(&[test("Outer", {
            let calls = calls.clone();
            move |t| {
                t.run("internal", {
                    let calls = calls.clone();
                    move |t| {
                        package_parallel(t, &[counter("one", &calls)]).unwrap();
                        package_parallel(t, &[counter("two", &calls)]).unwrap();
                    }
                });
            }
        })]);

        assert!(summary.is_all_passed(), "{summary}");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(summary.result("Outer/internal").unwrap().parallel);
    }

    #[test]
    fn test_package_parallel_after_manual_mark() {
        let summary = run(&[test("Outer", |t| {
            t.run("marked", |t| {
                t.parallel();
                package_parallel(t, &[test("x", |_| {})]).unwrap();
            });
            t.run("mixed", |t| {
                parallel(t, &[test("y", |_| {})]).unwrap();
                package_parallel(t, &[test("z", |_| {})]).unwrap();
            });
        })]);

        assert!(summary.is_all_passed(), "{summary}");
        assert_eq!(summary.total, 6);
    }

    #[test]
    fn test_package_parallel_then_parallel() {
        let summary = run(&[test("Outer", |t| {
            t.run("reversed", |t| {
                package_parallel(t, &[test("z", |_| {})]).unwrap();
                parallel(t, &[test("y", |_| {})]).unwrap();
            });
        })]);

        assert!(summary.is_all_passed(), "{summary}");
        assert_eq!(summary.total, 4);
        assert!(summary.result("Outer/reversed").unwrap().parallel);
        assert!(summary.result("Outer/reversed/z").is_some());
        assert!(summary.result("Outer/reversed/y").is_some());
    }

    #[test]
    fn test_package_parallel_runs_top_level_tests_together() {
        let start = Instant::now();
        let summary = run(&[
            test("First", |t| package_parallel(t, &[sleeper("x")]).unwrap()),
            test("Second", |t| package_parallel(t, &[sleeper("y")]).unwrap()),
        ]);
        let elapsed = start.elapsed();

        assert!(summary.is_all_passed());
        assert!(summary.result("First").unwrap().parallel);
        assert!(elapsed < SINGLE + SLACK, "took {elapsed:?}");
    }

    #[test]
    fn test_declarations_are_reusable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let suite = vec![counter("a", &calls), group("g", [counter("b", &calls)])];

        for _ in 0..2 {
            let suite = suite.clone();
            let summary = run(&[test("Outer", move |t| parallel(t, &suite).unwrap())]);
            assert!(summary.is_all_passed());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_leaf_built_from_checked_constructor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let action: TestFn = {
            let calls = calls.clone();
            Arc::new(move |_: &TestContext| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        let leaf = Declaration::leaf("checked", Some(action)).unwrap();

        let summary = run(&[test("Outer", move |t| parallel(t, &[leaf.clone()]).unwrap())]);

        assert!(summary.is_all_passed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(summary.result("Outer/checked").is_some());
    }
}
