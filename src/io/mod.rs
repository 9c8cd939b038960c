//! Drainable source handles.
//!
//! A [`LineReader`] wraps any buffered reader so it can sit in a source partition
//! and be drained by [`get_lines`](crate::helpers::get_lines). [`from_files`] builds
//! one partition per file; with the `io-glob` feature, [`from_glob`] does the same
//! for every file matching a pattern.

#[cfg_attr(docsrs, doc(cfg(feature = "io-glob")))]
#[cfg(feature = "io-glob")]
pub mod glob;

#[cfg(feature = "io-glob")]
pub use glob::{expand_glob, from_glob};

use crate::collection::Dataset;
use crate::error::{EngineError, Result};
use crate::utils::lock;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A line-oriented reader shared by the worker that drains it.
pub struct LineReader {
    inner: Mutex<Box<dyn BufRead + Send>>,
    origin: Option<PathBuf>,
}

impl LineReader {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Box::new(reader)),
            origin: None,
        }
    }

    /// Reader over in-memory text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Cursor::new(text.into().into_bytes()))
    }

    /// Open `path` for reading.
    ///
    /// # Errors
    ///
    /// [`EngineError::Source`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EngineError::Source {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            inner: Mutex::new(Box::new(BufReader::new(file))),
            origin: Some(path.to_path_buf()),
        })
    }

    /// File this reader was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Next line including its terminator; `Ok(None)` at end of input.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD, so text in other
    /// encodings still yields one line per terminator.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let n = lock(&self.inner).read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(match String::from_utf8(buf) {
            Ok(line) => line,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }))
    }
}

impl std::fmt::Debug for LineReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineReader").field("path", &self.origin).finish()
    }
}

/// One source partition per file, in the given order.
///
/// # Errors
///
/// [`EngineError::Source`] naming the first file that cannot be opened.
pub fn from_files<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Dataset<LineReader>> {
    let readers = paths
        .into_iter()
        .map(LineReader::open)
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::from_sources(readers))
}
