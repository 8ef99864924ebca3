//! Error types
//!
//! Both variants describe contract violations rather than runtime conditions.
//! Callers are expected to fail fast on them, typically by unwrapping inside
//! the test that made the call.

use thiserror::Error;

/// Errors returned by the declaration constructors and executors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required argument was absent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The host runner no longer exposes the state the probe depends on
    #[error("host runner incompatible: {0}")]
    HostIncompatible(String),
}

pub type Result<T> = std::result::Result<T, Error>;
