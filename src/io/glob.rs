//! Glob-expanded file sources.
//!
//! # Examples
//!
//! ```no_run
//! use ironrdd::io::glob::from_glob;
//!
//! // one partition per log file, in sorted path order
//! let logs = from_glob("logs/*.log")?;
//! # Ok::<(), ironrdd::EngineError>(())
//! ```

use super::{LineReader, from_files};
use crate::collection::Dataset;
use crate::error::{EngineError, Result};
use anyhow::Context;
use glob::glob;
use std::path::PathBuf;

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Directories are skipped. No match is an empty vector, not an error.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a matched entry cannot be read.
pub fn expand_glob(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// One source partition per file matching `pattern`.
///
/// # Errors
///
/// [`EngineError::Glob`] for a bad pattern, [`EngineError::Source`] if a matched
/// file cannot be opened.
pub fn from_glob(pattern: &str) -> Result<Dataset<LineReader>> {
    let files = expand_glob(pattern).map_err(|err| EngineError::Glob(format!("{err:#}")))?;
    tracing::debug!(pattern, files = files.len(), "expanded source glob");
    from_files(files)
}
