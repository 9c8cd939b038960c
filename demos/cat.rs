//! Print every line of the given files, in order.
//!
//! Run with: cargo run --example cat -- file1 [file2 ...]

use anyhow::{Result, bail};
use ironrdd::helpers::{get_lines, string_printer};
use ironrdd::io::from_files;
use ironrdd::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        bail!("need at least one file");
    }

    let rt = Runtime::start(RuntimeConfig::default())?;
    let lines = from_files(&files)?.map(get_lines);
    rt.print(&lines, string_printer)?;
    rt.shutdown()?;
    Ok(())
}
