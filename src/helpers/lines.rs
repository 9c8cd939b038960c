use super::hash::bucket;
use crate::io::LineReader;
use tracing::warn;

/// Generator mapper over a [`LineReader`]: the next line with its terminator, or
/// `None` at end of input.
///
/// # Panics
///
/// Panics on a read error, which fails the running task with
/// [`EngineError::Panicked`](crate::EngineError::Panicked) instead of ending the
/// stream early.
pub fn get_lines(reader: &LineReader) -> Option<String> {
    match reader.read_line() {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, path = ?reader.path(), "read failed");
            panic!("failed to read source {:?}: {err}", reader.path());
        }
    }
}

/// Filter: keep lines that contain `needle`.
#[allow(clippy::ptr_arg)]
pub fn string_contains(line: &String, needle: &String) -> bool {
    line.contains(needle.as_str())
}

/// Partitioner: djb2 of the whole string.
#[allow(clippy::ptr_arg)]
pub fn string_hash_partitioner(s: &String, num_partitions: usize) -> usize {
    bucket(s.as_bytes(), num_partitions)
}

/// Printer: the string as is, no newline added.
#[allow(clippy::ptr_arg)]
pub fn string_printer(s: &String) {
    print!("{s}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::djb2;

    #[test]
    fn get_lines_drains_then_stops() {
        let r = LineReader::from_text("x y\nz\n");
        assert_eq!(get_lines(&r).as_deref(), Some("x y\n"));
        assert_eq!(get_lines(&r).as_deref(), Some("z\n"));
        assert_eq!(get_lines(&r), None);
    }

    #[test]
    fn contains_is_substring_match() {
        let needle = "b".to_string();
        assert!(string_contains(&"abc\n".to_string(), &needle));
        assert!(!string_contains(&"a\n".to_string(), &needle));
    }

    #[test]
    fn string_partitioner_matches_djb2() {
        let s = "hello".to_string();
        assert_eq!(string_hash_partitioner(&s, 4) as u64, djb2(b"hello") % 4);
        assert_eq!(string_hash_partitioner(&s, 1), 0);
    }
}
