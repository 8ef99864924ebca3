//! Host test runner
//!
//! A thread-backed runner providing the primitives the executors build on:
//! named subtests, marking a subtest parallel, and phases that release
//! marked subtests together.

mod context;
mod runner;
mod slots;

pub use context::TestContext;
pub use runner::{run_tests, Runner};
