//! Print the lines containing a query, or count them with `--count`.
//!
//! Run with: cargo run --example grep -- [--count] <query> file1 [file2 ...]

use anyhow::{Result, bail};
use ironrdd::helpers::{get_lines, string_contains, string_printer};
use ironrdd::io::from_files;
use ironrdd::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let count_only = args.first().is_some_and(|a| a == "--count");
    if count_only {
        args.remove(0);
    }
    if args.len() < 2 {
        bail!("usage: grep [--count] <query> file1 ...");
    }
    let query = args.remove(0);

    let rt = Runtime::start(RuntimeConfig::default())?;
    let matches = from_files(&args)?
        .map(get_lines)
        .filter_with(string_contains, query);

    if count_only {
        println!("found {} matches", rt.count(&matches)?);
    } else {
        rt.print(&matches, string_printer)?;
    }
    rt.shutdown()?;
    Ok(())
}
