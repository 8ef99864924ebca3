//! partest - declare trees of tests and run them in parallel
//!
//! Instead of marking every subtest parallel by hand, declare the tree once
//! and hand it to [`package_parallel`] or [`parallel`]:
//!
//! ```no_run
//! use partest::{group, package_parallel, run_tests, test};
//!
//! let summary = run_tests(&[test("TestMyFunc", |t| {
//!     package_parallel(
//!         t,
//!         &[
//!             test("should do something", |_| {}),
//!             test("should do something else", |_| {}),
//!             group(
//!                 "some condition",
//!                 [
//!                     test("should not do something", |_| {}),
//!                     test("should not do something else", |_| {}),
//!                 ],
//!             ),
//!         ],
//!     )
//!     .expect("context is present");
//! })]);
//! assert!(summary.is_all_passed());
//! ```
//!
//! which behaves the same as marking by hand:
//!
//! ```no_run
//! # use partest::run_tests;
//! # use partest::models::test;
//! run_tests(&[test("TestMyFunc", |t| {
//!     t.parallel();
//!     t.phase(|| {
//!         t.run("should do something", |t| t.parallel());
//!         t.run("should do something else", |t| t.parallel());
//!         t.run("some condition", |t| {
//!             t.parallel();
//!             t.phase(|| {
//!                 t.run("should not do something", |t| t.parallel());
//!                 t.run("should not do something else", |t| t.parallel());
//!             });
//!         });
//!     });
//! })]);
//! ```
//!
//! ## Modules
//!
//! - [`models`]: test declarations and run results
//! - [`executor`]: `parallel` and `package_parallel`
//! - [`host`]: the thread-backed runner the executors drive
//! - [`config`]: runner configuration from files and environment
//! - [`output`]: text and JSON reports

pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod models;
pub mod output;
pub mod utils;

pub use config::RunnerConfig;
pub use error::{Error, Result};
pub use executor::{package_parallel, parallel};
pub use host::{run_tests, Runner, TestContext};
pub use models::{group, test, Declaration, RunSummary, TestFn, TestResult, TestStatus};
