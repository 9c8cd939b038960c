//! Lightweight unique identifier for dataset nodes.
//!
//! Every [`Node`](crate::node::Node) built by a constructor is assigned the next
//! value of a process-wide counter, so ids stay unique across independent graphs
//! and across runtimes. They show up in the metrics log and in errors.
//!
//! They’re small, `Copy`, and hashable, so they can be used efficiently as keys
//! in maps or sets while planning an action.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Unique numeric identifier for a node in a dataset graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw value. Only useful for tests and log parsing; graph
    /// constructors use [`NodeId::next`].
    pub fn new(v: u64) -> Self {
        Self(v)
    }

    /// Allocate a fresh id.
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the underlying numeric value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
