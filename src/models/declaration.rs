//! Test declarations
//!
//! A declaration tree is built once, before anything runs, and is read-only
//! afterwards. Leaves carry a test body, groups carry ordered children that
//! run concurrently with each other once the group itself runs.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::host::TestContext;

/// A test body
pub type TestFn = Arc<dyn Fn(&TestContext) + Send + Sync>;

/// A single test or a named group of tests
#[derive(Clone)]
pub enum Declaration {
    Leaf { name: String, action: TestFn },
    Group { name: String, children: Vec<Declaration> },
}

impl Declaration {
    /// Create a leaf, rejecting an absent action
    pub fn leaf(name: impl Into<String>, action: Option<TestFn>) -> Result<Self> {
        let action = action.ok_or_else(|| {
            Error::InvalidArgument("argument action can not be absent".to_string())
        })?;

        Ok(Declaration::Leaf {
            name: name.into(),
            action,
        })
    }

    /// Create a group. Zero children is a valid no-op group.
    pub fn group(name: impl Into<String>, children: impl IntoIterator<Item = Declaration>) -> Self {
        Declaration::Group {
            name: name.into(),
            children: children.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Leaf { name, .. } | Declaration::Group { name, .. } => name,
        }
    }

    /// Direct children; always empty for a leaf
    pub fn children(&self) -> &[Declaration] {
        match self {
            Declaration::Leaf { .. } => &[],
            Declaration::Group { children, .. } => children,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Declaration::Group { .. })
    }

    /// Number of leaves reachable from this declaration
    pub fn leaf_count(&self) -> usize {
        match self {
            Declaration::Leaf { .. } => 1,
            Declaration::Group { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }
}

impl PartialEq for Declaration {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Declaration::Leaf { name: a, action: f },
                Declaration::Leaf { name: b, action: g },
            ) => a == b && Arc::ptr_eq(f, g),
            (
                Declaration::Group { name: a, children: x },
                Declaration::Group { name: b, children: y },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Leaf { name, .. } => f.debug_tuple("Leaf").field(name).finish(),
            Declaration::Group { name, children } => f
                .debug_struct("Group")
                .field("name", name)
                .field("children", children)
                .finish(),
        }
    }
}

/// Declare a single test.
///
/// ```ignore
/// let check = partest::test("should add", |t| {
///     if 1 + 1 != 2 {
///         t.error("math is broken");
///     }
/// });
/// ```
pub fn test<F>(name: impl Into<String>, f: F) -> Declaration
where
    F: Fn(&TestContext) + Send + Sync + 'static,
{
    Declaration::Leaf {
        name: name.into(),
        action: Arc::new(f),
    }
}

/// Declare a group whose children run in parallel when the group runs
pub fn group(name: impl Into<String>, children: impl IntoIterator<Item = Declaration>) -> Declaration {
    Declaration::group(name, children)
}
