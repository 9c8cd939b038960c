//! Join two whitespace-separated tables on their first column and sum the second.
//!
//! Run with: cargo run --example sumjoin -- left.txt right.txt

use anyhow::{Result, bail};
use ironrdd::helpers::{
    ColumnPartitionCtx, SumJoinCtx, column_hash_partitioner, get_lines, row_printer, split_cols,
    sum_join,
};
use ironrdd::io::from_files;
use ironrdd::{Runtime, RuntimeConfig};

const PARTITIONS: usize = 8;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [left, right] = args.as_slice() else {
        bail!("usage: sumjoin <left> <right>");
    };

    let rt = Runtime::start(RuntimeConfig::default())?;
    let by_key = ColumnPartitionCtx { keynum: 0 };
    let left = from_files([left])?
        .map(get_lines)
        .map(split_cols)
        .partition_by_with(column_hash_partitioner, PARTITIONS, by_key);
    let right = from_files([right])?
        .map(get_lines)
        .map(split_cols)
        .partition_by_with(column_hash_partitioner, PARTITIONS, by_key);

    let joined = left.join_with(&right, sum_join, SumJoinCtx { keynum: 0, target: 1 });
    rt.print(&joined, row_printer)?;
    rt.shutdown()?;
    Ok(())
}
