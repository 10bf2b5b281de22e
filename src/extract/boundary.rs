//! Record-aligned partition boundaries.
//!
//! A raw cut may fall anywhere inside a record. A partition that does not
//! start the stream skips everything up to and including the first newline
//! at or after its raw start; every partition but the last reaches forward
//! past its raw end through the first newline at or after it. Both rules
//! look for the same newline at a shared cut, so the fragment around the
//! cut is claimed by the earlier partition exactly once.

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::io::ReadAt;

use super::partition::{ByteRange, Partition};
use super::{ensure_running, read_chunk};

/// Upper bound on a single probe read while searching for a separator
const PROBE_SIZE: usize = 64 * 1024;

/// Record separator
pub const SEPARATOR: u8 = b'\n';

/// Offset of the first separator at or after `from`, or `None` when the
/// stream ends first.
///
/// A record can be arbitrarily long, so `cancel` is checked before every
/// probe read.
pub async fn find_separator<R: ReadAt + ?Sized>(
    source: &R,
    ordinal: usize,
    from: u64,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<Option<u64>> {
    let len = source.size();
    let mut buf = vec![0u8; buffer_size.clamp(1, PROBE_SIZE)];
    let mut pos = from;

    while pos < len {
        ensure_running(cancel, ordinal)?;
        let want = (len - pos).min(buf.len() as u64) as usize;
        let n = read_chunk(source, ordinal, pos, &mut buf[..want]).await?;
        if let Some(i) = buf[..n].iter().position(|&b| b == SEPARATOR) {
            return Ok(Some(pos + i as u64));
        }
        pos += n as u64;
    }
    Ok(None)
}

/// Byte just past the first separator at or after `from`, or the end of
/// the stream.
async fn after_separator<R: ReadAt + ?Sized>(
    source: &R,
    ordinal: usize,
    from: u64,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<u64> {
    Ok(match find_separator(source, ordinal, from, buffer_size, cancel).await? {
        Some(at) => at + 1,
        None => source.size(),
    })
}

/// Resolve a raw partition to the record-aligned range its worker scans.
///
/// The resolved ranges of a tiling of `[0, L)` are themselves a tiling of
/// `[0, L)`; some may be empty when a partition holds no record start.
pub async fn resolve<R: ReadAt + ?Sized>(
    source: &R,
    partition: &Partition,
    buffer_size: usize,
    cancel: &CancellationToken,
) -> Result<ByteRange> {
    let len = source.size();
    let raw = partition.range;

    let start = if raw.start == 0 {
        0
    } else {
        after_separator(source, partition.ordinal, raw.start, buffer_size, cancel).await?
    };

    let end = if raw.end >= len {
        len
    } else {
        after_separator(source, partition.ordinal, raw.end, buffer_size, cancel).await?
    };

    Ok(ByteRange::new(start, end.max(start)))
}
