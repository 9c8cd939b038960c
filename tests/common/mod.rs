#![allow(dead_code)]

use ironrdd::{Runtime, RuntimeConfig};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A runtime with `workers` threads and no metrics file.
pub fn runtime(workers: usize) -> anyhow::Result<Runtime> {
    init_tracing();
    Ok(Runtime::start(
        RuntimeConfig::default()
            .with_worker_threads(workers)
            .without_metrics_log(),
    )?)
}

/// Shared invocation counter for transforms.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Burn a little CPU so tasks overlap.
pub fn spin(iterations: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..iterations {
        acc = std::hint::black_box(acc.wrapping_mul(31).wrapping_add(i));
    }
    acc
}
