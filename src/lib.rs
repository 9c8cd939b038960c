//! # ironrdd
//!
//! A single-machine, in-memory **dataflow engine** in the style of Spark RDDs. A
//! program describes a lazy graph of datasets, each split into partitions; an action
//! then materializes the graph on a pool of worker threads, one task per partition,
//! while a monitor thread records how long every task took.
//!
//! ## Key Features
//!
//! - **Lazy graph API** - `map`, `filter`, `join`, `partition_by` build nodes, nothing runs
//! - **Partition-level parallelism** - a fixed worker pool resolves partitions as soon as
//!   their inputs are materialized
//! - **Exactly-once materialization** - every partition of every node is computed once,
//!   even when several actions share ancestors
//! - **Drainable sources** - files and in-memory text become source partitions that a
//!   mapper drains line by line
//! - **Task metrics** - one log line per task plus an aggregate [`MetricsSummary`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use ironrdd::helpers::{get_lines, string_contains};
//! use ironrdd::io::LineReader;
//! use ironrdd::{Dataset, Runtime, RuntimeConfig};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let rt = Runtime::start(RuntimeConfig::default())?;
//!
//! let text = Dataset::from_sources(vec![LineReader::from_text("a\nb\nc\n")]);
//! let matches = text
//!     .map(get_lines)
//!     .filter_with(string_contains, "b".to_string());
//!
//! assert_eq!(rt.count(&matches)?, 1);
//! rt.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Dataset
//!
//! A [`Dataset<T>`] is a typed handle to one node of the graph. Sources
//! ([`Dataset::from_sources`], [`Dataset::from_partitions`], [`io::from_files`]) are
//! materialized at construction; every other node starts with empty partition slots.
//!
//! - [`map`](Dataset::map) - transform each element, `None` drops it. Directly over a
//!   handle source the mapper is a generator, called until it returns `None`.
//! - [`filter`](Dataset::filter) - keep elements matching a predicate
//! - [`join`](Dataset::join) - per-partition cross product through a joiner
//! - [`partition_by`](Dataset::partition_by) - redistribute into a new partition count
//!
//! The `*_with` variants take a context value owned by the node.
//!
//! ### Runtime
//!
//! A [`Runtime`] owns the worker pool and the monitor thread. Actions
//! ([`execute`](Runtime::execute), [`count`](Runtime::count), [`print`](Runtime::print),
//! [`collect`](Runtime::collect)) block until the target is fully materialized. A failing
//! or panicking transform fails the whole action with an [`EngineError`]; partitions
//! computed before the failure are kept.
//!
//! ### Configuration
//!
//! [`RuntimeConfig`] selects the worker count (default: one per CPU) and the metrics log
//! path (default: `metrics.log`). It can be loaded from JSON with
//! [`RuntimeConfig::from_file`].
//!
//! ## Feature Flags
//!
//! - `io-glob` (default) - [`io::from_glob`], one source partition per matching file
//!
//! ## Module Overview
//!
//! - [`collection`] - `Dataset` and the graph constructors
//! - [`runner`] - `Runtime`, lifecycle and actions
//! - [`node`] - graph nodes, readiness and per-kind partition kernels
//! - [`task`] / [`worker`] / [`monitor`] - the scheduling machinery
//! - [`metrics`] - task records and their aggregate
//! - [`io`] - source handles
//! - [`helpers`] - stock mappers, filters, joiners, partitioners and printers
//! - [`testing`] - a test runtime and collection assertions

pub mod collection;
pub mod config;
pub mod error;
pub mod helpers;
pub mod io;
pub mod metrics;
pub mod monitor;
pub mod node;
pub mod node_id;
pub mod partition;
pub mod runner;
pub mod task;
pub mod testing;
pub mod type_token;
mod utils;
pub mod worker;

pub use collection::Dataset;
pub use config::RuntimeConfig;
pub use error::{EngineError, Result};
pub use metrics::{DurationStats, MetricsSummary, TaskMetric};
pub use node::TransformKind;
pub use node_id::NodeId;
pub use runner::Runtime;
