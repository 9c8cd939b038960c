//! Count the lines of all given files, then report per-kind task metrics.
//!
//! Run with: cargo run --example linecount -- file1 [file2 ...]

use anyhow::{Result, bail};
use ironrdd::helpers::get_lines;
use ironrdd::io::from_files;
use ironrdd::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        bail!("need at least one file");
    }

    let rt = Runtime::start(RuntimeConfig::default())?;
    let total = rt.count(&from_files(&files)?.map(get_lines))?;
    let summary = rt.metrics();
    rt.shutdown()?;

    println!("total number of lines in all files: {total}");
    println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
    Ok(())
}
