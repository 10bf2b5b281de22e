//! Concurrent, boundary-safe scan-and-filter engine.
//!
//! The decompressed stream `[0, L)` is cut into near-equal raw partitions
//! ([`partition`]), each raw range is aligned to record separators
//! ([`boundary`]), every aligned range is scanned by its own task
//! ([`scanner`]), and the [`Extractor`] writes the per-partition matches to
//! a sink in partition order as soon as each becomes writable.

pub mod boundary;
mod dispatcher;
pub mod partition;
pub mod scanner;
mod summary;

pub use dispatcher::Extractor;
pub use partition::{ByteRange, Partition, partition, plan};
pub use scanner::{ChunkScanner, MatchSet, PartitionStats};
pub use summary::{RunSummary, format_size};

use tokio_util::sync::CancellationToken;

use crate::error::{ExtractError, Result};
use crate::io::ReadAt;

/// Stop a partition between reads once the run has been aborted.
pub(crate) fn ensure_running(cancel: &CancellationToken, ordinal: usize) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ExtractError::Cancelled { ordinal });
    }
    Ok(())
}

/// Single positioned read, attributing failures to a partition and offset.
pub(crate) async fn read_chunk<R: ReadAt + ?Sized>(
    source: &R,
    ordinal: usize,
    offset: u64,
    buf: &mut [u8],
) -> Result<usize> {
    source
        .read_at(offset, buf)
        .await
        .map_err(|cause| ExtractError::SourceRead {
            ordinal,
            offset,
            cause,
        })
}
