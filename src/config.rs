//! Runtime configuration.
//!
//! ```
//! use ironrdd::RuntimeConfig;
//!
//! let cfg = RuntimeConfig::default()
//!     .with_worker_threads(4)
//!     .without_metrics_log();
//! assert_eq!(cfg.resolved_worker_threads(), 4);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default metrics log location, relative to the working directory.
pub const DEFAULT_METRICS_LOG: &str = "metrics.log";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads; `None` means one per available CPU.
    pub worker_threads: Option<usize>,
    /// Metrics log file; `None` disables the file.
    pub metrics_log: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            metrics_log: Some(PathBuf::from(DEFAULT_METRICS_LOG)),
        }
    }
}

impl RuntimeConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading runtime config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing runtime config {}", path.display()))
    }

    #[must_use]
    pub fn with_worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = Some(n);
        self
    }

    #[must_use]
    pub fn with_metrics_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_log = Some(path.into());
        self
    }

    #[must_use]
    pub fn without_metrics_log(mut self) -> Self {
        self.metrics_log = None;
        self
    }

    /// Number of workers the runtime will spawn; never zero.
    #[must_use]
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}
