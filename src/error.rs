//! Error type shared by the runtime, the graph and the source helpers.

use crate::node_id::NodeId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open metrics log {}: {source}", path.display())]
    MetricsLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open source {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An erased callable received an element of a different concrete type.
    #[error("element type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },

    #[error("partitioner returned {index}, outside 0..{num_partitions}")]
    PartitionOutOfRange { index: usize, num_partitions: usize },

    #[error("partition {partition} of {node} is not materialized")]
    MissingPartition { node: NodeId, partition: usize },

    #[error("partition {partition} of {node} was already materialized")]
    AlreadyMaterialized { node: NodeId, partition: usize },

    #[error("transform panicked: {0}")]
    Panicked(String),

    #[error("task for partition {partition} of {node} failed: {source}")]
    TaskFailed {
        node: NodeId,
        partition: usize,
        #[source]
        source: Box<EngineError>,
    },

    #[error("{0} thread panicked")]
    ThreadPanicked(String),

    #[error("runtime is shut down")]
    ShutDown,

    #[error("invalid source glob: {0}")]
    Glob(String),
}

impl EngineError {
    /// Wrap an error raised while resolving one partition of `node`.
    pub(crate) fn in_task(self, node: NodeId, partition: usize) -> Self {
        match self {
            err @ EngineError::TaskFailed { .. } => err,
            other => EngineError::TaskFailed {
                node,
                partition,
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failure_wraps_once() {
        let node = NodeId::new(7);
        let err = EngineError::Panicked("boom".into()).in_task(node, 2);
        let err = err.in_task(NodeId::new(9), 0);
        match err {
            EngineError::TaskFailed { node: n, partition, source } => {
                assert_eq!(n, node);
                assert_eq!(partition, 2);
                assert!(matches!(*source, EngineError::Panicked(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn messages_name_the_partition() {
        let err = EngineError::MissingPartition { node: NodeId::new(3), partition: 1 };
        assert_eq!(err.to_string(), "partition 1 of node#3 is not materialized");
    }
}
