//! Positioned, concurrent read access to byte sources.
//!
//! Every source the extractor scans (a local file, a remote archive over
//! HTTP Range requests, a member inside a zip, an in-memory buffer) is
//! exposed through [`ReadAt`]. Implementations must allow concurrent calls
//! at disjoint offsets from many workers without exclusive locking.

mod http;
mod local;
mod memory;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use memory::MemoryReader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// May return fewer bytes than `buf.len()`; `0` means end of stream.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Keep reading until `buf` is full or the source is exhausted.
    ///
    /// Returns the number of bytes placed in `buf`.
    async fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
