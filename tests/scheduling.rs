//! Exactly-once materialization, readiness and action lifecycle.

mod common;

use common::{Calls, runtime, spin};
use ironrdd::helpers::string_hash_partitioner;
use ironrdd::testing::{TestRuntime, assert_collections_unordered_equal};
use ironrdd::{Dataset, TransformKind};
use std::sync::Arc;
use std::thread;

#[test]
fn every_partition_is_computed_once() -> anyhow::Result<()> {
    let rt = runtime(8)?;
    let calls = Calls::default();
    let parts: Vec<Vec<u64>> = (0..16).map(|p| (p * 100..p * 100 + 50).collect()).collect();
    let src = Dataset::from_partitions(parts);

    let c = calls.clone();
    let mapped = src.map(move |n: &u64| {
        c.hit();
        spin(200);
        Some(n + 1)
    });
    let kept = mapped.filter(|n: &u64| n % 3 != 0);

    let expected: usize = (0..16u64)
        .flat_map(|p| p * 100..p * 100 + 50)
        .filter(|n| (n + 1) % 3 != 0)
        .count();
    assert_eq!(rt.count(&kept)?, expected);
    assert_eq!(calls.get(), 16 * 50);
    assert_eq!(mapped.materialized_partitions(), 16);
    assert_eq!(kept.materialized_partitions(), 16);

    // a later action over the same nodes does no new work
    assert_eq!(rt.count(&mapped)?, 16 * 50);
    assert_eq!(rt.count(&kept)?, expected);
    assert_eq!(calls.get(), 16 * 50);

    let summary = rt.metrics();
    assert_eq!(summary.completed(TransformKind::Map), 16);
    assert_eq!(summary.completed(TransformKind::Filter), 16);
    rt.shutdown()?;
    Ok(())
}

#[test]
fn shared_ancestor_in_a_diamond_runs_once() -> anyhow::Result<()> {
    let rt = runtime(4)?;
    let calls = Calls::default();
    let src = Dataset::from_partitions(vec![vec![1i32, 2, 3], vec![4, 5]]);

    let c = calls.clone();
    let base = src.map(move |n: &i32| {
        c.hit();
        Some(*n)
    });
    let evens = base.filter(|n: &i32| n % 2 == 0);
    let odds = base.filter(|n: &i32| n % 2 == 1);
    let pairs = evens.join(&odds, |e: &i32, o: &i32| Some((*e, *o)));
    let self_join = base.join(&base, |a: &i32, b: &i32| (a == b).then_some(*a));

    let got = rt.collect(&pairs)?;
    assert_collections_unordered_equal(&got, &[(2, 1), (2, 3), (4, 5)]);
    assert_eq!(rt.collect(&self_join)?, vec![1, 2, 3, 4, 5]);
    assert_eq!(calls.get(), 5);
    rt.shutdown()?;
    Ok(())
}

#[test]
fn partition_by_reads_the_whole_dependency() -> anyhow::Result<()> {
    let rt = runtime(6)?;
    let words: Vec<Vec<String>> = (0..10)
        .map(|p| (0..30).map(|i| format!("{p}:{i}")).collect())
        .collect();
    let slow = Dataset::from_partitions(words).map(|w: &String| {
        spin(500);
        Some(w.clone())
    });
    let moved = slow.partition_by(string_hash_partitioner, 7);

    let parts = rt.collect_partitions(&moved)?;
    assert_eq!(parts.len(), 7);
    assert_eq!(parts.iter().map(Vec::len).sum::<usize>(), 300);
    for (p, part) in parts.iter().enumerate() {
        assert!(part.iter().all(|w| string_hash_partitioner(w, 7) == p));
    }
    rt.shutdown()?;
    Ok(())
}

#[test]
fn empty_partitions_and_empty_sources() -> anyhow::Result<()> {
    let rt = runtime(2)?;
    let none: Dataset<u8> = Dataset::from_partitions(Vec::new());
    let mapped = none.map(|b: &u8| Some(*b));
    assert_eq!(rt.count(&mapped)?, 0);
    assert!(mapped.is_materialized());

    let hollow = Dataset::from_partitions(vec![Vec::<u8>::new(), Vec::new()]);
    let joined = hollow.join(&hollow, |a: &u8, b: &u8| Some(a + b));
    let moved = joined.partition_by(|b: &u8, n| usize::from(*b) % n, 3);
    assert_eq!(rt.count(&moved)?, 0);
    assert_eq!(moved.materialized_partitions(), 3);

    let dropped = Dataset::from_partitions(vec![vec![1u8, 2, 3]]).map(|_: &u8| None::<u8>);
    assert_eq!(rt.count(&dropped)?, 0);
    rt.shutdown()?;
    Ok(())
}

#[test]
fn single_worker_resolves_deep_chains() -> anyhow::Result<()> {
    let rt = runtime(1)?;
    let mut ds = Dataset::from_partitions(vec![vec![0u64], vec![10], vec![20]]);
    for _ in 0..40 {
        ds = ds.map(|n: &u64| Some(n + 1));
    }
    let moved = ds.partition_by(|n: &u64, parts| (*n as usize) % parts, 2);
    let mut got = rt.collect(&moved)?;
    got.sort_unstable();
    assert_eq!(got, vec![40, 50, 60]);
    rt.shutdown()?;
    Ok(())
}

#[test]
fn concurrent_callers_are_serialized() -> anyhow::Result<()> {
    let rt = Arc::new(TestRuntime::new()?);
    let calls = Calls::default();
    let c = calls.clone();
    let shared = Dataset::from_partitions((0..8).map(|p| vec![p; 25]).collect::<Vec<Vec<u32>>>())
        .map(move |n: &u32| {
            c.hit();
            Some(*n)
        });

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rt = Arc::clone(&rt);
            let branch = shared.filter(move |n: &u32| n % 4 == i);
            thread::spawn(move || rt.count(&branch))
        })
        .collect();
    let mut total = 0;
    for h in handles {
        total += h.join().expect("caller thread")?;
    }
    assert_eq!(total, 200);
    assert_eq!(calls.get(), 200);
    Ok(())
}

#[test]
fn source_target_returns_immediately() -> anyhow::Result<()> {
    let rt = runtime(2)?;
    let src = Dataset::from_partitions(vec![vec!["a"; 3], vec!["b"; 2]]);
    rt.execute(&src)?;
    assert_eq!(rt.count(&src)?, 5);
    assert_eq!(rt.metrics().tasks_completed, 0);
    assert_eq!(rt.num_workers(), 2);
    rt.shutdown()?;
    Ok(())
}

#[test]
fn summary_counts_every_task() -> anyhow::Result<()> {
    let rt = runtime(2)?;
    let src = Dataset::from_partitions((0..4).map(|p| vec![p; 10]).collect::<Vec<Vec<u16>>>());
    let slow = src.map(|n: &u16| {
        spin(20_000);
        Some(*n)
    });
    let moved = slow.partition_by(|n: &u16, parts| usize::from(*n) % parts, 2);
    assert_eq!(rt.count(&moved)?, 40);

    let summary = rt.metrics();
    assert_eq!(summary.tasks_completed, 6);
    assert_eq!(summary.completed(TransformKind::PartitionBy), 2);
    assert_eq!(summary.failed_tasks, 0);
    assert_eq!(summary.execution_us.count, 6);
    rt.shutdown()?;
    Ok(())
}

#[test]
fn very_deep_chains_plan_run_and_drop() -> anyhow::Result<()> {
    let rt = runtime(1)?;
    let mut ds = Dataset::from_partitions(vec![vec![0u64, 1]]);
    for _ in 0..10_000 {
        ds = ds.map(|n: &u64| Some(n + 1));
    }
    assert_eq!(rt.count(&ds)?, 2);
    assert_eq!(rt.collect(&ds)?, vec![10_000, 10_001]);
    rt.shutdown()?;
    drop(ds);

    // building and releasing an unexecuted chain is just as flat
    let mut lazy = Dataset::from_partitions(vec![vec![0u8]]);
    for _ in 0..100_000 {
        lazy = lazy.filter(|_: &u8| true);
    }
    assert_eq!(lazy.materialized_partitions(), 0);
    drop(lazy);
    Ok(())
}
