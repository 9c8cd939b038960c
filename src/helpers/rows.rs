use super::hash::bucket;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most columns a [`Row`] keeps; further columns are dropped.
pub const MAX_COLS: usize = 10;
/// Column buffer size; a column keeps at most `MAX_LEN - 1` bytes.
pub const MAX_LEN: usize = 32;

/// A whitespace-split line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    cols: Vec<String>,
}

impl Row {
    /// Build a row, applying the column count and column width limits.
    pub fn new<S: AsRef<str>>(cols: impl IntoIterator<Item = S>) -> Self {
        let cols = cols
            .into_iter()
            .take(MAX_COLS)
            .map(|c| truncate(c.as_ref()).to_string())
            .collect();
        Self { cols }
    }

    pub fn cols(&self) -> &[String] {
        &self.cols
    }

    pub fn col(&self, i: usize) -> Option<&str> {
        self.cols.get(i).map(String::as_str)
    }

    pub fn ncols(&self) -> usize {
        self.cols.len()
    }
}

/// Tab separated.
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cols.join("\t"))
    }
}

fn truncate(col: &str) -> &str {
    let mut end = col.len().min(MAX_LEN - 1);
    while !col.is_char_boundary(end) {
        end -= 1;
    }
    &col[..end]
}

/// Mapper: split on spaces, tabs and newlines, skipping empty fields.
#[allow(clippy::ptr_arg, clippy::unnecessary_wraps)]
pub fn split_cols(line: &String) -> Option<Row> {
    Some(Row::new(line.split([' ', '\t', '\n']).filter(|c| !c.is_empty())))
}

/// Context for [`sum_join`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumJoinCtx {
    /// Column compared for equality.
    pub keynum: usize,
    /// Column summed as an integer.
    pub target: usize,
}

/// Joiner: rows with equal key columns become `[key, a.target + b.target]`.
///
/// A row without the key column never matches. Target columns are read like C's
/// `atoi`: leading whitespace, optional sign, leading digits; anything else is 0.
pub fn sum_join(a: &Row, b: &Row, ctx: &SumJoinCtx) -> Option<Row> {
    let key = a.col(ctx.keynum)?;
    if b.col(ctx.keynum)? != key {
        return None;
    }
    let sum = atoi(a.col(ctx.target).unwrap_or("")) + atoi(b.col(ctx.target).unwrap_or(""));
    Some(Row::new([key.to_string(), sum.to_string()]))
}

fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative { -magnitude } else { magnitude }
}

/// Context for [`column_hash_partitioner`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPartitionCtx {
    pub keynum: usize,
}

/// Partitioner: djb2 of one column. A missing column hashes as the empty string.
pub fn column_hash_partitioner(row: &Row, num_partitions: usize, ctx: &ColumnPartitionCtx) -> usize {
    bucket(row.col(ctx.keynum).unwrap_or("").as_bytes(), num_partitions)
}

/// Printer: columns tab separated, newline terminated.
pub fn row_printer(row: &Row) {
    println!("{row}");
}
