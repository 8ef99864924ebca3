//! Test execution engine
//!
//! Runs declaration trees against a host context, marking every declared
//! test parallel with its siblings.

mod parallel;
mod probe;

pub(crate) use parallel::invoke;
pub use parallel::{package_parallel, parallel};
