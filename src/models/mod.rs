//! Data models
//!
//! Test declarations and the results produced by running them.

mod declaration;
mod test_result;

pub use declaration::{group, test, Declaration, TestFn};
pub use test_result::{RunSummary, TestResult, TestStatus};
