//! Per-task execution records and their aggregate.
//!
//! Every task carries a [`TaskMetric`] from the moment it is planned. The worker
//! that resolves it stamps the scheduled time and the execution duration, then
//! hands it to the monitor thread, which writes one log line per record
//! ([`TaskMetric::log_line`]) and folds it into a [`MetricsSummary`].
//!
//! # Example
//!
//! ```no_run
//! use ironrdd::{Dataset, Runtime, RuntimeConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let rt = Runtime::start(RuntimeConfig::default().with_metrics_log("metrics.log"))?;
//! let words = Dataset::from_partitions(vec![vec!["a b c".to_string()]])
//!     .map(|s: &String| Some(s.len()));
//! rt.count(&words)?;
//!
//! let summary = rt.metrics();
//! summary.save_to_file("summary.json")?;
//! rt.shutdown()?;
//! # Ok(())
//! # }
//! ```

use crate::node::TransformKind;
use crate::node_id::NodeId;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::time::{Duration, Instant};

/// Timing record of one task.
#[derive(Clone, Debug)]
pub struct TaskMetric {
    pub node: NodeId,
    pub partition: usize,
    pub kind: TransformKind,
    /// When the task was planned.
    pub created: Instant,
    /// When a worker found it ready and started resolving it.
    pub scheduled: Option<Instant>,
    /// Scheduled to finished.
    pub duration: Duration,
}

impl TaskMetric {
    pub fn new(node: NodeId, partition: usize, kind: TransformKind) -> Self {
        Self {
            node,
            partition,
            kind,
            created: Instant::now(),
            scheduled: None,
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn mark_scheduled(&mut self) -> Instant {
        let now = Instant::now();
        self.scheduled = Some(now);
        now
    }

    pub(crate) fn mark_finished(&mut self) {
        if let Some(start) = self.scheduled {
            self.duration = start.elapsed();
        }
    }

    /// One log line; timestamps are seconds since `origin` with microsecond precision.
    ///
    /// ```text
    /// RDD 4 Part 0 Trans Map -- creation          0.000112, scheduled          0.000348, execution (usec) 57
    /// ```
    pub fn log_line(&self, origin: Instant) -> String {
        let created = self.created.saturating_duration_since(origin);
        let scheduled = self
            .scheduled
            .map(|s| s.saturating_duration_since(origin))
            .unwrap_or_default();
        format!(
            "RDD {} Part {} Trans {} -- creation {:>10}.{:06}, scheduled {:>10}.{:06}, execution (usec) {}",
            self.node.raw(),
            self.partition,
            self.kind,
            created.as_secs(),
            created.subsec_micros(),
            scheduled.as_secs(),
            scheduled.subsec_micros(),
            self.duration.as_micros(),
        )
    }
}

/// Execution-duration statistics, in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DurationStats {
    pub count: u64,
    pub sum: u64,
    pub mean: f64,
    pub min: u64,
    pub max: u64,
}

impl DurationStats {
    #[allow(clippy::cast_precision_loss)]
    fn record(&mut self, micros: u64) {
        if self.count == 0 {
            self.min = micros;
            self.max = micros;
        } else {
            self.min = self.min.min(micros);
            self.max = self.max.max(micros);
        }
        self.count += 1;
        self.sum += micros;
        self.mean = self.sum as f64 / self.count as f64;
    }
}

/// Aggregate view of everything the runtime executed so far.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricsSummary {
    /// Completed tasks, all kinds.
    pub tasks_completed: u64,
    /// Completed tasks keyed by transform kind name.
    pub tasks_by_kind: BTreeMap<String, u64>,
    /// Tasks pushed back because their dependencies were not ready.
    pub requeues: u64,
    /// Tasks whose transform failed.
    pub failed_tasks: u64,
    pub execution_us: DurationStats,
}

impl MetricsSummary {
    pub(crate) fn record(&mut self, metric: &TaskMetric) {
        self.tasks_completed += 1;
        *self.tasks_by_kind.entry(metric.kind.to_string()).or_default() += 1;
        let micros = u64::try_from(metric.duration.as_micros()).unwrap_or(u64::MAX);
        self.execution_us.record(micros);
    }

    /// Completed tasks of one kind.
    #[must_use]
    pub fn completed(&self, kind: TransformKind) -> u64 {
        self.tasks_by_kind.get(&kind.to_string()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Save the summary as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let mut file = File::create(path)?;
        let formatted = serde_json::to_string_pretty(self)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(kind: TransformKind, micros: u64) -> TaskMetric {
        let mut m = TaskMetric::new(NodeId::new(1), 0, kind);
        m.scheduled = Some(m.created);
        m.duration = Duration::from_micros(micros);
        m
    }

    #[test]
    fn log_line_layout() {
        let origin = Instant::now();
        let mut m = TaskMetric::new(NodeId::new(12), 3, TransformKind::PartitionBy);
        m.created = origin + Duration::from_micros(1_000_250);
        m.scheduled = Some(origin + Duration::from_micros(2_000_500));
        m.duration = Duration::from_micros(42);
        assert_eq!(
            m.log_line(origin),
            "RDD 12 Part 3 Trans PartitionBy -- creation          1.000250, scheduled          2.000500, execution (usec) 42"
        );
    }

    #[test]
    fn summary_aggregates_by_kind() {
        let mut s = MetricsSummary::default();
        s.record(&finished(TransformKind::Map, 10));
        s.record(&finished(TransformKind::Map, 30));
        s.record(&finished(TransformKind::Join, 20));

        assert_eq!(s.tasks_completed, 3);
        assert_eq!(s.completed(TransformKind::Map), 2);
        assert_eq!(s.completed(TransformKind::Filter), 0);
        assert_eq!(s.execution_us.min, 10);
        assert_eq!(s.execution_us.max, 30);
        assert_eq!(s.execution_us.mean, 20.0);

        let json = s.to_json();
        assert_eq!(json["tasks_by_kind"]["Join"], 1);
        assert_eq!(json["execution_us"]["sum"], 60);
    }

    #[test]
    fn save_to_file_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let mut s = MetricsSummary::default();
        s.record(&finished(TransformKind::Filter, 5));
        s.save_to_file(path.to_str().unwrap()).unwrap();
        let back: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["tasks_completed"], 1);
    }
}
