use std::fmt;

use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};

/// Half-open byte range `[start, end)` over the decompressed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start {start} past end {end}");
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A raw byte range assigned to one worker, with the ordinal that restores
/// output order after out-of-order completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub ordinal: usize,
    pub range: ByteRange,
}

/// Split `[0, len)` into `count` contiguous ranges of near-equal size.
///
/// The first `len % count` ranges are one byte longer than the rest.
/// An empty stream yields no ranges.
pub fn partition(len: u64, count: usize) -> Result<Vec<ByteRange>> {
    if count == 0 {
        return Err(ExtractError::config("partition count must be at least 1"));
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let k = count as u64;
    let base = len / k;
    let extra = len % k;

    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..k {
        let size = base + u64::from(i < extra);
        ranges.push(ByteRange::new(start, start + size));
        start += size;
    }
    debug_assert_eq!(start, len);
    Ok(ranges)
}

/// Number of partitions for a stream of `len` bytes.
///
/// Never more than the worker count, and never so many that a partition
/// falls below `min_chunk_bytes` (except the single partition of a tiny
/// stream).
pub fn partition_count(len: u64, config: &ExtractConfig) -> usize {
    if len == 0 {
        return 0;
    }
    let by_size = len.div_ceil(config.min_chunk_bytes.max(1));
    (config.worker_count as u64).min(by_size).max(1) as usize
}

/// Partitions for a stream of `len` bytes under `config`.
pub fn plan(len: u64, config: &ExtractConfig) -> Result<Vec<Partition>> {
    config.validate()?;
    let count = partition_count(len, config);
    if count == 0 {
        return Ok(Vec::new());
    }
    Ok(partition(len, count)?
        .into_iter()
        .enumerate()
        .map(|(ordinal, range)| Partition { ordinal, range })
        .collect())
}

/// Check that partitions are numbered `0..K` and tile `[0, len)` exactly.
pub fn check_tiling(partitions: &[Partition], len: u64) -> Result<()> {
    let mut expected_start = 0;
    for (i, p) in partitions.iter().enumerate() {
        if p.ordinal != i {
            return Err(ExtractError::config(format!(
                "partition at position {i} has ordinal {}",
                p.ordinal
            )));
        }
        if p.range.start != expected_start || p.range.end < p.range.start {
            return Err(ExtractError::config(format!(
                "partition {i} range {} does not continue at {expected_start}",
                p.range
            )));
        }
        expected_start = p.range.end;
    }
    if expected_start != len {
        return Err(ExtractError::config(format!(
            "partitions cover [0, {expected_start}) but the stream has {len} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remainder_goes_to_first_ranges() {
        let ranges = partition(10, 3).unwrap();
        assert_eq!(
            ranges,
            vec![
                ByteRange::new(0, 4),
                ByteRange::new(4, 7),
                ByteRange::new(7, 10)
            ]
        );
    }

    #[test]
    fn zero_count_is_invalid() {
        assert!(matches!(
            partition(100, 0),
            Err(ExtractError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_stream_has_no_partitions() {
        assert!(partition(0, 4).unwrap().is_empty());
        assert!(plan(0, &ExtractConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn small_streams_are_not_oversplit() {
        let config = ExtractConfig {
            worker_count: 16,
            min_chunk_bytes: 1000,
            read_buffer_size: 64,
        };
        assert_eq!(partition_count(1, &config), 1);
        assert_eq!(partition_count(1000, &config), 1);
        assert_eq!(partition_count(1001, &config), 2);
        assert_eq!(partition_count(1_000_000, &config), 16);
    }

    #[test]
    fn tiling_check_rejects_gaps() {
        let parts = vec![
            Partition { ordinal: 0, range: ByteRange::new(0, 5) },
            Partition { ordinal: 1, range: ByteRange::new(6, 10) },
        ];
        assert!(check_tiling(&parts, 10).is_err());

        let parts = plan(10, &ExtractConfig { worker_count: 3, min_chunk_bytes: 1, read_buffer_size: 4 }).unwrap();
        assert!(check_tiling(&parts, 10).is_ok());
        assert!(check_tiling(&parts, 11).is_err());
    }

    proptest! {
        #[test]
        fn ranges_tile_the_stream(len in 0u64..1_000_000, count in 1usize..64) {
            let ranges = partition(len, count).unwrap();
            if len == 0 {
                prop_assert!(ranges.is_empty());
            } else {
                prop_assert_eq!(ranges.len(), count);
                prop_assert_eq!(ranges[0].start, 0);
                prop_assert_eq!(ranges[ranges.len() - 1].end, len);
                for pair in ranges.windows(2) {
                    prop_assert_eq!(pair[0].end, pair[1].start);
                    prop_assert!(pair[0].len() >= pair[1].len());
                    prop_assert!(pair[0].len() - pair[1].len() <= 1);
                }
            }
        }

        #[test]
        fn plan_respects_worker_and_floor(len in 1u64..10_000_000, workers in 1usize..32, floor in 1u64..100_000) {
            let config = ExtractConfig { worker_count: workers, min_chunk_bytes: floor, read_buffer_size: 4096 };
            let parts = plan(len, &config).unwrap();
            prop_assert!(!parts.is_empty());
            prop_assert!(parts.len() <= workers);
            prop_assert!(parts.iter().all(|p| !p.range.is_empty()));
            prop_assert!(check_tiling(&parts, len).is_ok());
        }
    }
}
