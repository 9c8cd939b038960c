//! The runtime: worker pool, monitor thread, and the action entry points.
//!
//! A [`Runtime`] owns `N` named worker threads (`rdd-worker-0`, ...) and one monitor
//! thread (`rdd-monitor`). Building a [`Dataset`](crate::Dataset) graph does no work;
//! an action ([`Runtime::execute`], [`Runtime::count`], [`Runtime::print`],
//! [`Runtime::collect`]) plans one task per empty partition slot reachable from the
//! target, flips the shared `started` flag, and blocks until the worker that writes
//! the target's last partition (or the first failing task) clears it again.
//!
//! ```no_run
//! use ironrdd::{Dataset, Runtime, RuntimeConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let rt = Runtime::start(RuntimeConfig::default().without_metrics_log())?;
//! let nums = Dataset::from_partitions(vec![vec![1u32, 2, 3], vec![4, 5]]);
//! let even = nums.filter(|n: &u32| n % 2 == 0);
//! assert_eq!(rt.count(&even)?, 2);
//! rt.shutdown()?;
//! # Ok(())
//! # }
//! ```

use crate::collection::Dataset;
use crate::config::RuntimeConfig;
use crate::error::{EngineError, Result};
use crate::metrics::{MetricsSummary, TaskMetric};
use crate::monitor::{MetricsSink, run_monitor};
use crate::node::Node;
use crate::node_id::NodeId;
use crate::task::{Task, TaskQueue};
use crate::type_token::Data;
use crate::utils::{lock, wait_while};
use crate::worker::run_worker;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

struct WorkState {
    started: bool,
    shutdown: bool,
    epoch: u64,
    /// Tasks of the current epoch a worker is holding.
    running: usize,
    failure: Option<EngineError>,
}

/// State shared between the driver, the workers and the monitor.
pub(crate) struct Shared {
    pub(crate) tasks: TaskQueue<Task>,
    pub(crate) metrics: Arc<TaskQueue<TaskMetric>>,
    work: Mutex<WorkState>,
    work_start: Condvar,
    work_ready: Condvar,
    requeues: AtomicU64,
    failures: AtomicU64,
    published: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            tasks: TaskQueue::new(),
            metrics: Arc::new(TaskQueue::new()),
            work: Mutex::new(WorkState {
                started: false,
                shutdown: false,
                epoch: 0,
                running: 0,
                failure: None,
            }),
            work_start: Condvar::new(),
            work_ready: Condvar::new(),
            requeues: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }

    /// Block until an action is running. `None` once shutdown was requested.
    pub(crate) fn wait_for_start(&self) -> Option<u64> {
        let guard = lock(&self.work);
        let state = wait_while(&self.work_start, guard, |s| !s.started && !s.shutdown);
        (!state.shutdown).then_some(state.epoch)
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        lock(&self.work).shutdown
    }

    /// Take ownership of `task` for its action. False if the action already
    /// finished or failed, in which case the task is dropped.
    pub(crate) fn claim(&self, task: &Task) -> bool {
        let mut state = lock(&self.work);
        if state.started && state.epoch == task.epoch {
            state.running += 1;
            true
        } else {
            false
        }
    }

    /// Counterpart of a successful [`claim`](Self::claim).
    pub(crate) fn release(&self) {
        lock(&self.work).running -= 1;
        self.work_ready.notify_all();
    }

    pub(crate) fn requeue(&self, task: Task) {
        trace!(?task, "dependencies not ready, requeueing");
        self.requeues.fetch_add(1, Ordering::Relaxed);
        self.tasks.push(task);
    }

    /// Hand a finished task's record to the monitor.
    pub(crate) fn publish(&self, metric: TaskMetric) {
        self.published.fetch_add(1, Ordering::Release);
        self.metrics.push(metric);
    }

    fn begin_action(&self) -> u64 {
        let mut state = lock(&self.work);
        state.epoch += 1;
        state.started = true;
        state.failure = None;
        state.epoch
    }

    /// Clear `started` for `epoch` and wake the driver. Later calls for the same
    /// epoch are ignored.
    pub(crate) fn finish_action(&self, epoch: u64, failure: Option<EngineError>) {
        let mut state = lock(&self.work);
        if state.epoch == epoch && state.started {
            state.started = false;
            state.failure = failure;
        } else if let Some(err) = failure {
            debug!(error = %err, "ignoring failure of a finished action");
        }
        drop(state);
        self.work_ready.notify_all();
    }

    /// Abandon `epoch`: drop every queued task and hand `err` to the driver.
    pub(crate) fn fail_action(&self, epoch: u64, err: EngineError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        let dropped = self.tasks.clear();
        trace!(dropped, "cleared task queue");
        self.finish_action(epoch, Some(err));
    }

    /// Block until the action is over and no worker still holds one of its tasks.
    fn wait_for_finish(&self) -> Result<()> {
        let guard = lock(&self.work);
        let mut state = wait_while(&self.work_ready, guard, |s| {
            (s.started || s.running > 0) && !s.shutdown
        });
        if state.started {
            state.started = false;
            return Err(EngineError::ShutDown);
        }
        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn request_shutdown(&self) {
        lock(&self.work).shutdown = true;
        self.work_start.notify_all();
        self.work_ready.notify_all();
        self.tasks.close();
    }
}

/// Handle to a running worker pool.
///
/// Dropping a runtime that was not [shut down](Runtime::shutdown) explicitly shuts it
/// down and discards any teardown error.
pub struct Runtime {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    monitor: Option<JoinHandle<()>>,
    summary: Arc<Mutex<MetricsSummary>>,
    action: Mutex<()>,
    num_workers: usize,
}

impl Runtime {
    /// Spawn the monitor and the worker pool, and open the metrics log.
    ///
    /// # Errors
    ///
    /// [`EngineError::MetricsLog`] if the log file cannot be created,
    /// [`EngineError::Spawn`] if a thread cannot be spawned. Threads spawned before
    /// the failure are stopped and joined.
    pub fn start(config: RuntimeConfig) -> Result<Self> {
        let sink = match &config.metrics_log {
            Some(path) => MetricsSink::create(path)?,
            None => MetricsSink::Discard,
        };
        let num_workers = config.resolved_worker_threads();
        let origin = Instant::now();
        let shared = Arc::new(Shared::new());
        let summary = Arc::new(Mutex::new(MetricsSummary::default()));

        let monitor = {
            let queue = Arc::clone(&shared.metrics);
            let summary = Arc::clone(&summary);
            thread::Builder::new()
                .name("rdd-monitor".to_string())
                .spawn(move || run_monitor(queue, sink, summary, origin))
                .map_err(|source| EngineError::Spawn {
                    role: "monitor".to_string(),
                    source,
                })?
        };

        let mut runtime = Runtime {
            shared,
            workers: Vec::with_capacity(num_workers),
            monitor: Some(monitor),
            summary,
            action: Mutex::new(()),
            num_workers,
        };

        for index in 0..num_workers {
            let shared = Arc::clone(&runtime.shared);
            let spawned = thread::Builder::new()
                .name(format!("rdd-worker-{index}"))
                .spawn(move || run_worker(shared, index));
            match spawned {
                Ok(handle) => runtime.workers.push(handle),
                Err(source) => {
                    if let Err(err) = runtime.teardown() {
                        warn!(error = %err, "teardown after failed start");
                    }
                    return Err(EngineError::Spawn {
                        role: format!("worker {index}"),
                        source,
                    });
                }
            }
        }

        info!(
            workers = num_workers,
            metrics_log = ?config.metrics_log,
            "runtime started"
        );
        Ok(runtime)
    }

    /// Stop every thread, drain the remaining metrics and close the log.
    ///
    /// # Errors
    ///
    /// [`EngineError::ThreadPanicked`] if a worker or the monitor panicked.
    pub fn shutdown(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.workers.is_empty() && self.monitor.is_none() {
            return Ok(());
        }
        self.shared.request_shutdown();

        let mut first_err = None;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                first_err.get_or_insert(EngineError::ThreadPanicked(name));
            }
        }
        // Workers are gone; nothing can publish any more.
        self.shared.metrics.close();
        if let Some(handle) = self.monitor.take() {
            if handle.join().is_err() {
                first_err.get_or_insert(EngineError::ThreadPanicked("rdd-monitor".to_string()));
            }
        }

        info!("runtime shut down");
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Snapshot of everything executed so far.
    ///
    /// Waits for the monitor to drain the records published before the call.
    pub fn metrics(&self) -> MetricsSummary {
        let published = self.shared.published.load(Ordering::Acquire);
        let mut snapshot = loop {
            let summary = lock(&self.summary);
            let monitor_gone = self.monitor.as_ref().is_none_or(JoinHandle::is_finished);
            if summary.tasks_completed >= published || monitor_gone {
                break summary.clone();
            }
            drop(summary);
            thread::yield_now();
        };
        snapshot.requeues = self.shared.requeues.load(Ordering::Relaxed);
        snapshot.failed_tasks = self.shared.failures.load(Ordering::Relaxed);
        snapshot
    }

    /// Materialize every partition of `dataset`.
    ///
    /// Returns immediately if it is already materialized (sources always are). Only
    /// one action runs at a time; concurrent callers wait their turn.
    ///
    /// # Errors
    ///
    /// The first task failure of the action (see [`EngineError::TaskFailed`]), or
    /// [`EngineError::ShutDown`].
    pub fn execute<T: Data>(&self, dataset: &Dataset<T>) -> Result<()> {
        self.execute_node(dataset.node())
    }

    fn execute_node(&self, target: &Arc<Node>) -> Result<()> {
        let _action = lock(&self.action);
        if self.shared.is_shutdown() {
            return Err(EngineError::ShutDown);
        }
        if target.is_materialized() {
            trace!(node = %target.id(), "target already materialized");
            return Ok(());
        }

        let epoch = self.shared.begin_action();
        let tasks = plan(target, epoch);
        debug!(node = %target.id(), epoch, tasks = tasks.len(), "action planned");
        self.shared.tasks.push_all(tasks);
        self.shared.work_start.notify_all();

        let outcome = self.shared.wait_for_finish();
        match &outcome {
            Ok(()) => debug!(node = %target.id(), epoch, "action complete"),
            Err(err) => debug!(node = %target.id(), epoch, error = %err, "action failed"),
        }
        outcome
    }

    /// Materialize `dataset` and return its total element count.
    pub fn count<T: Data>(&self, dataset: &Dataset<T>) -> Result<usize> {
        self.execute(dataset)?;
        Ok(dataset.node().partitions()?.iter().map(|p| p.len()).sum())
    }

    /// Materialize `dataset` and call `printer` on every element, in partition order
    /// then insertion order, on the calling thread.
    pub fn print<T: Data>(&self, dataset: &Dataset<T>, mut printer: impl FnMut(&T)) -> Result<()> {
        self.execute(dataset)?;
        for partition in dataset.node().partitions()? {
            for element in partition.typed::<T>() {
                printer(element?);
            }
        }
        Ok(())
    }

    /// Materialize `dataset` and clone its elements out, in the same order as
    /// [`print`](Self::print).
    pub fn collect<T: Data + Clone>(&self, dataset: &Dataset<T>) -> Result<Vec<T>> {
        self.execute(dataset)?;
        let mut out = Vec::new();
        for partition in dataset.node().partitions()? {
            for element in partition.typed::<T>() {
                out.push(element?.clone());
            }
        }
        Ok(out)
    }

    /// Like [`collect`](Self::collect) but keeps the partition boundaries.
    pub fn collect_partitions<T: Data + Clone>(&self, dataset: &Dataset<T>) -> Result<Vec<Vec<T>>> {
        self.execute(dataset)?;
        dataset
            .node()
            .partitions()?
            .iter()
            .map(|partition| partition.typed::<T>().map(|e| e.cloned()).collect())
            .collect()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(error = %err, "runtime teardown failed");
        }
    }
}

/// Tasks for every empty slot reachable from `target`, dependencies first.
///
/// Each node is visited once, and materialized nodes are not descended into. The
/// walk keeps its own stack so graph depth is not bounded by the thread stack.
fn plan(target: &Arc<Node>, epoch: u64) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    // (node, whether its dependencies were already pushed)
    let mut stack: Vec<(&Arc<Node>, bool)> = vec![(target, false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            let terminal = node.id() == target.id();
            for p in node.empty_slots() {
                out.push(Task::new(Arc::clone(node), p, terminal, epoch));
            }
            continue;
        }
        if !seen.insert(node.id()) || node.is_materialized() {
            continue;
        }
        stack.push((node, true));
        for dep in node.deps().iter().rev() {
            stack.push((dep, false));
        }
    }
    out
}
