//! Parallel marker probe
//!
//! The host offers no public way to ask whether a context has already been
//! marked parallel, and marking twice is fatal. This is the one place that
//! reads the host's private marker.

use crate::error::{Error, Result};
use crate::host::TestContext;

/// Whether `t` has already been marked parallel.
///
/// Fails with [`Error::HostIncompatible`] when the marker cannot be read,
/// rather than guessing.
pub(crate) fn already_parallel(t: &TestContext) -> Result<bool> {
    t.parallel_flag().ok_or_else(|| {
        Error::HostIncompatible(format!(
            "parallel marker of {:?} is unreadable, its run state is gone",
            t.name()
        ))
    })
}
