//! Scheduling units and the FIFO they travel through.

use crate::metrics::TaskMetric;
use crate::node::Node;
use crate::utils::{lock, wait_while};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// "Materialize partition `partition` of `node`."
pub struct Task {
    pub node: Arc<Node>,
    pub partition: usize,
    /// Set on the tasks of the action's target node.
    pub terminal: bool,
    /// Action this task was planned for.
    pub epoch: u64,
    pub metric: TaskMetric,
}

impl Task {
    pub fn new(node: Arc<Node>, partition: usize, terminal: bool, epoch: u64) -> Self {
        let metric = TaskMetric::new(node.id(), partition, node.kind());
        Self {
            node,
            partition,
            terminal,
            epoch,
            metric,
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("node", &self.node.id())
            .field("partition", &self.partition)
            .field("terminal", &self.terminal)
            .field("epoch", &self.epoch)
            .finish()
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded, thread-safe FIFO with a not-empty condition.
///
/// [`push`](Self::push) and [`pop`](Self::pop) never block; [`pop_wait`](Self::pop_wait)
/// layers blocking on top and returns `None` once the queue is closed and empty.
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Append to the tail and wake one waiter.
    pub fn push(&self, item: T) {
        lock(&self.state).items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Append many items under one lock acquisition and wake every waiter.
    pub fn push_all(&self, items: impl IntoIterator<Item = T>) {
        lock(&self.state).items.extend(items);
        self.not_empty.notify_all();
    }

    /// Remove the head, if any.
    pub fn pop(&self) -> Option<T> {
        lock(&self.state).items.pop_front()
    }

    /// Remove the head, blocking while the queue is empty and still open.
    pub fn pop_wait(&self) -> Option<T> {
        let guard = lock(&self.state);
        let mut guard = wait_while(&self.not_empty, guard, |s| s.items.is_empty() && !s.closed);
        guard.items.pop_front()
    }

    /// Drop every queued item; returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = lock(&self.state);
        let n = state.items.len();
        state.items.clear();
        n
    }

    /// Wake all waiters for good. Items already queued can still be popped.
    pub fn close(&self) {
        lock(&self.state).closed = true;
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let q = TaskQueue::new();
        q.push(1);
        q.push_all([2, 3]);
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn pop_wait_wakes_on_push() {
        let q = Arc::new(TaskQueue::new());
        let q2 = Arc::clone(&q);
        let h = thread::spawn(move || q2.pop_wait());
        thread::sleep(Duration::from_millis(20));
        q.push("task");
        assert_eq!(h.join().unwrap(), Some("task"));
    }

    #[test]
    fn close_releases_waiters_after_draining() {
        let q = Arc::new(TaskQueue::<u8>::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || q.pop_wait())
            })
            .collect();
        thread::sleep(Duration::from_millis(20));
        q.close();
        for w in waiters {
            assert_eq!(w.join().unwrap(), None);
        }

        let q = TaskQueue::new();
        q.push(9);
        q.close();
        assert_eq!(q.pop_wait(), Some(9));
        assert_eq!(q.pop_wait(), None);
    }

    #[test]
    fn clear_reports_dropped() {
        let q = TaskQueue::new();
        q.push_all(0..5);
        assert_eq!(q.clear(), 5);
        assert!(q.is_empty());
    }
}
