//! The monitor thread: drains finished-task metrics into the log and the summary.

use crate::error::{EngineError, Result};
use crate::metrics::{MetricsSummary, TaskMetric};
use crate::task::TaskQueue;
use crate::utils::lock;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, warn};

/// Where metric lines go.
pub enum MetricsSink {
    File(BufWriter<File>),
    /// Aggregate only; no log file.
    Discard,
}

impl MetricsSink {
    /// Create (truncate) the log file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| EngineError::MetricsLog {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(MetricsSink::File(BufWriter::new(file)))
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            MetricsSink::File(w) => writeln!(w, "{line}"),
            MetricsSink::Discard => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            MetricsSink::File(w) => w.flush(),
            MetricsSink::Discard => Ok(()),
        }
    }
}

/// Body of the monitor thread.
///
/// Runs until the metrics queue is closed, then writes out whatever was still
/// queued and flushes the log.
pub(crate) fn run_monitor(
    queue: Arc<TaskQueue<TaskMetric>>,
    mut sink: MetricsSink,
    summary: Arc<Mutex<MetricsSummary>>,
    origin: Instant,
) {
    let mut written = 0u64;
    while let Some(metric) = queue.pop_wait() {
        lock(&summary).record(&metric);
        if let Err(err) = sink.write_line(&metric.log_line(origin)) {
            warn!(error = %err, node = %metric.node, "failed to write metrics line");
        }
        written += 1;
    }
    if let Err(err) = sink.flush() {
        warn!(error = %err, "failed to flush metrics log");
    }
    debug!(records = written, "monitor stopped");
}
