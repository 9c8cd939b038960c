//! The worker-pool loop.
//!
//! Each worker waits for an action to start, pops a task, and either resolves it
//! or pushes it back to the tail of the queue when its dependencies are not
//! materialized yet. Readiness only ever flips from false to true and the graph is
//! acyclic with materialized sources at the bottom, so some queued task is always
//! runnable and the requeue cycle terminates.

use crate::error::EngineError;
use crate::runner::Shared;
use crate::task::Task;
use crate::utils::panic_message;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

pub(crate) fn run_worker(shared: Arc<Shared>, index: usize) {
    trace!(worker = index, "worker started");
    loop {
        if shared.wait_for_start().is_none() {
            break;
        }
        let Some(task) = shared.tasks.pop_wait() else {
            break;
        };
        if shared.is_shutdown() {
            break;
        }
        if !shared.claim(&task) {
            trace!(worker = index, ?task, "dropping task of a finished action");
            continue;
        }
        if task.node.is_ready(task.partition) {
            resolve(&shared, task, index);
            shared.release();
        } else {
            shared.requeue(task);
            shared.release();
            thread::yield_now();
        }
    }
    debug!(worker = index, "worker stopped");
}

/// Materialize one partition and report the outcome.
fn resolve(shared: &Shared, task: Task, worker: usize) {
    let Task {
        node,
        partition,
        terminal,
        epoch,
        mut metric,
    } = task;

    metric.mark_scheduled();
    let computed = panic::catch_unwind(AssertUnwindSafe(|| node.compute_partition(partition)))
        .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload.as_ref()))));
    metric.mark_finished();

    let stored = computed.and_then(|store| {
        trace!(worker, node = %node.id(), partition, elements = store.len(), "partition computed");
        node.store_partition(partition, store)
    });

    match stored {
        Ok(completed) => {
            shared.publish(metric);
            if terminal && completed {
                debug!(node = %node.id(), "target node materialized");
                shared.finish_action(epoch, None);
            }
        }
        Err(err) => {
            let err = err.in_task(node.id(), partition);
            warn!(worker, error = %err, "task failed, abandoning action");
            shared.fail_action(epoch, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Dataset;

    #[test]
    fn only_stored_partitions_are_published() {
        let shared = Shared::new();
        let src = Dataset::from_partitions(vec![vec![1u32, 2], vec![3]]);
        let doubled = src.map(|n: &u32| Some(n * 2));
        let node = doubled.node();

        resolve(&shared, Task::new(Arc::clone(node), 0, false, 0), 0);
        assert_eq!(shared.metrics.len(), 1);
        assert!(node.has_partition(0));

        // a second task for the same slot is rejected and leaves no record
        resolve(&shared, Task::new(Arc::clone(node), 0, false, 0), 0);
        assert_eq!(shared.metrics.len(), 1);
        assert_eq!(node.materialized_count(), 1);
    }
}
