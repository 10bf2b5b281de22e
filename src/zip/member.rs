use async_trait::async_trait;
use flate2::CrcWriter;
use flate2::write::DeflateDecoder;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::io::{LocalFileReader, ReadAt};
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Compressed bytes pulled from the archive per read while spooling
const SPOOL_CHUNK: usize = 1024 * 1024;

/// Pick the log member of an archive.
///
/// An explicit `name` must match the entry's full path or its base name.
/// Otherwise the first file ending in `.log` or `.txt` wins, falling back
/// to the first file of any kind.
pub fn select_log_member<'a>(
    entries: &'a [ZipFileEntry],
    name: Option<&str>,
) -> Result<&'a ZipFileEntry> {
    let mut files = entries.iter().filter(|e| !e.is_directory);

    if let Some(name) = name {
        return match files.find(|e| e.file_name == name || e.base_name() == name) {
            Some(entry) => Ok(entry),
            None => bail!("Member {name} not found in archive"),
        };
    }

    let candidates: Vec<_> = files.collect();
    candidates
        .iter()
        .find(|e| e.has_log_extension())
        .or_else(|| candidates.first())
        .copied()
        .ok_or_else(|| anyhow::anyhow!("No log file found in archive"))
}

/// Window over a STORED member: reads pass straight through to the archive.
pub struct EntryWindow<R: ReadAt> {
    reader: Arc<R>,
    base: u64,
    len: u64,
}

#[async_trait]
impl<R: ReadAt> ReadAt for EntryWindow<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.len {
            return Ok(0);
        }
        let n = (buf.len() as u64).min(self.len - offset) as usize;
        self.reader.read_at(self.base + offset, &mut buf[..n]).await
    }

    fn size(&self) -> u64 {
        self.len
    }
}

/// Decompressed log stream of one archive member.
pub enum LogStream<R: ReadAt> {
    /// Uncompressed member read in place
    Stored(EntryWindow<R>),
    /// Deflated member decompressed into an anonymous temporary file
    Spooled(LocalFileReader),
}

#[async_trait]
impl<R: ReadAt> ReadAt for LogStream<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self {
            LogStream::Stored(window) => window.read_at(offset, buf).await,
            LogStream::Spooled(file) => file.read_at(offset, buf).await,
        }
    }

    fn size(&self) -> u64 {
        match self {
            LogStream::Stored(window) => window.size(),
            LogStream::Spooled(file) => file.size(),
        }
    }
}

/// Opens the log member of a ZIP archive as a random access byte source.
pub struct ZipLogSource<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipLogSource<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// Locate the log member and expose its decompressed bytes.
    pub async fn open(&self, member: Option<&str>) -> Result<(ZipFileEntry, LogStream<R>)> {
        let entries = self.parser.list_files().await?;
        let entry = select_log_member(&entries, member)?.clone();

        if entry.is_encrypted() {
            bail!("Member {} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(&entry).await?;
        info!(
            member = %entry.file_name,
            method = %entry.compression_method,
            size = entry.uncompressed_size,
            "log member located"
        );

        let stream = match entry.compression_method {
            CompressionMethod::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    bail!("Stored member {} has inconsistent sizes", entry.file_name);
                }
                LogStream::Stored(EntryWindow {
                    reader: self.parser.reader().clone(),
                    base: data_offset,
                    len: entry.uncompressed_size,
                })
            }
            CompressionMethod::Deflate => {
                LogStream::Spooled(self.spool_deflated(&entry, data_offset).await?)
            }
            CompressionMethod::Unknown(_) => bail!(
                "Unsupported compression method: {} (only stored and deflate are supported)",
                entry.compression_method
            ),
        };

        Ok((entry, stream))
    }

    /// Inflate a member into a temporary file, checking CRC-32 and size.
    ///
    /// The file is unlinked on creation and vanishes with the returned reader.
    async fn spool_deflated(&self, entry: &ZipFileEntry, data_offset: u64) -> Result<LocalFileReader> {
        let started = Instant::now();
        let spool = tempfile::tempfile()?;
        let mut decoder = DeflateDecoder::new(CrcWriter::new(spool));

        let mut buf = vec![0u8; SPOOL_CHUNK];
        let mut offset = 0u64;
        while offset < entry.compressed_size {
            let want = (entry.compressed_size - offset).min(SPOOL_CHUNK as u64) as usize;
            let n = self
                .parser
                .reader()
                .read_full_at(data_offset + offset, &mut buf[..want])
                .await?;
            if n == 0 {
                bail!("Archive ended inside member {}", entry.file_name);
            }
            decoder.write_all(&buf[..n])?;
            offset += n as u64;
        }

        let crc_writer = decoder.finish()?;
        let crc = crc_writer.crc().sum();
        if crc != entry.crc32 {
            bail!(
                "CRC mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                crc
            );
        }

        let mut spool = crc_writer.into_inner();
        spool.flush()?;
        let reader = LocalFileReader::from_file(spool)?;
        if reader.size() != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, inflated {}",
                entry.file_name,
                entry.uncompressed_size,
                reader.size()
            );
        }

        debug!(
            member = %entry.file_name,
            bytes = reader.size(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "member inflated to spool file"
        );
        Ok(reader)
    }
}
