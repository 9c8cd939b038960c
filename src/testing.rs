//! Testing utilities for dataset graphs.
//!
//! # Quick Start
//!
//! ```no_run
//! use ironrdd::Dataset;
//! use ironrdd::testing::*;
//!
//! #[test]
//! fn doubles() -> anyhow::Result<()> {
//!     let rt = TestRuntime::new()?;
//!     let doubled = Dataset::from_partitions(vec![vec![1, 2], vec![3]])
//!         .map(|x: &i32| Some(x * 2));
//!     assert_collections_equal(&rt.collect(&doubled)?, &[2, 4, 6]);
//!     Ok(())
//! }
//! ```

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::runner::Runtime;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

/// Workers used by [`TestRuntime::new`].
pub const TEST_WORKERS: usize = 4;

/// A [`Runtime`] with no metrics log file, shut down on drop.
pub struct TestRuntime {
    inner: Runtime,
}

impl TestRuntime {
    /// Start a runtime with [`TEST_WORKERS`] workers.
    pub fn new() -> Result<Self> {
        Self::with_workers(TEST_WORKERS)
    }

    pub fn with_workers(workers: usize) -> Result<Self> {
        let config = RuntimeConfig::default()
            .with_worker_threads(workers)
            .without_metrics_log();
        Ok(Self {
            inner: Runtime::start(config)?,
        })
    }

    /// Shut down and surface any teardown error.
    pub fn finish(self) -> Result<()> {
        self.inner.shutdown()
    }
}

impl Deref for TestRuntime {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        &self.inner
    }
}

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two collections hold the same elements with the same multiplicity,
/// in any order.
///
/// # Panics
///
/// Panics if some element occurs a different number of times.
///
/// ```
/// use ironrdd::testing::assert_collections_unordered_equal;
///
/// assert_collections_unordered_equal(&[3, 1, 1, 2], &[1, 2, 3, 1]);
/// ```
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    fn counts<T: Eq + Hash>(items: &[T]) -> HashMap<&T, usize> {
        let mut m = HashMap::new();
        for item in items {
            *m.entry(item).or_insert(0) += 1;
        }
        m
    }

    let (got, want) = (counts(actual), counts(expected));
    if got != want {
        let missing: Vec<_> = want
            .iter()
            .filter(|(k, n)| got.get(*k).copied().unwrap_or(0) < **n)
            .map(|(k, _)| *k)
            .collect();
        let extra: Vec<_> = got
            .iter()
            .filter(|(k, n)| want.get(*k).copied().unwrap_or(0) < **n)
            .map(|(k, _)| *k)
            .collect();
        panic!(
            "Collection content mismatch:\n  Missing elements: {missing:?}\n  Extra elements: {extra:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}

/// Assert that every element of partition `p` is routed to `p` by `route`.
///
/// # Panics
///
/// Panics on the first misplaced element.
pub fn assert_partitioned_by<T: Debug>(partitions: &[Vec<T>], route: impl Fn(&T, usize) -> usize) {
    let n = partitions.len();
    for (p, partition) in partitions.iter().enumerate() {
        for element in partition {
            let expected = route(element, n);
            assert_eq!(
                expected, p,
                "element {element:?} sits in partition {p} but routes to {expected}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_counts_duplicates() {
        assert_collections_unordered_equal(&["a", "b", "a"], &["a", "a", "b"]);
        let result = std::panic::catch_unwind(|| {
            assert_collections_unordered_equal(&["a", "a", "b"], &["a", "b", "b"]);
        });
        assert!(result.is_err());
    }

    #[test]
    fn partition_check_uses_partition_count() {
        assert_partitioned_by(&[vec![0u32, 2], vec![1, 3]], |v, n| *v as usize % n);
    }

    #[test]
    #[should_panic(expected = "routes to")]
    fn misplaced_element_panics() {
        assert_partitioned_by(&[vec![1u32], vec![0]], |v, n| *v as usize % n);
    }
}
