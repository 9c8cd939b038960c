//! Stock callables for line- and column-oriented text processing.
//!
//! Each function has the exact shape a [`Dataset`](crate::Dataset) constructor or
//! action expects, so it can be passed by name:
//!
//! ```no_run
//! use ironrdd::helpers::{ColumnPartitionCtx, column_hash_partitioner, get_lines, row_printer, split_cols};
//! use ironrdd::{Runtime, RuntimeConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let rt = Runtime::start(RuntimeConfig::default())?;
//! let rows = ironrdd::io::from_files(["sales.txt"])?
//!     .map(get_lines)
//!     .map(split_cols)
//!     .partition_by_with(column_hash_partitioner, 4, ColumnPartitionCtx { keynum: 0 });
//! rt.print(&rows, row_printer)?;
//! rt.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod hash;
mod lines;
mod rows;

pub use hash::djb2;
pub use lines::{get_lines, string_contains, string_hash_partitioner, string_printer};
pub use rows::{
    ColumnPartitionCtx, MAX_COLS, MAX_LEN, Row, SumJoinCtx, column_hash_partitioner, row_printer,
    split_cols, sum_join,
};
