/// Bernstein's djb2 string hash: `h = 5381; h = h * 33 + byte`, wrapping.
#[must_use]
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(5381u64, |h, &b| h.wrapping_mul(33).wrapping_add(u64::from(b)))
}

/// Bucket for `bytes` among `num_partitions` buckets.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn bucket(bytes: &[u8], num_partitions: usize) -> usize {
    (djb2(bytes) % num_partitions as u64) as usize
}
