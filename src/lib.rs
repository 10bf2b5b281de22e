//! # logslice
//!
//! Extract every log record of one calendar date from a single, very large
//! log stored inside a ZIP archive, using all cores and without an index.
//!
//! The log member is exposed as a random access byte source ([`ReadAt`]),
//! from a local archive or from a remote one through HTTP Range requests.
//! The stream is cut into byte ranges, each range is aligned to record
//! boundaries so no record is lost or seen twice, and the ranges are
//! scanned concurrently. Matches are written in stream order.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use logslice::{ExtractConfig, Extractor, LocalFileReader, OutputFile, ZipLogSource, parse_target_date};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let archive = Arc::new(LocalFileReader::new(Path::new("logs.zip"))?);
//!     let (_member, stream) = ZipLogSource::new(archive).open(None).await?;
//!
//!     let date = parse_target_date("2024-12-01")?;
//!     let mut output = OutputFile::create(Path::new("output"), date).await?;
//!
//!     let extractor = Extractor::new(ExtractConfig::default())?;
//!     let summary = extractor.run(Arc::new(stream), date, &mut output).await?;
//!     let path = output.commit().await?;
//!
//!     println!("{} -> {}", summary, path.display());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod date;
pub mod error;
pub mod extract;
pub mod io;
pub mod logging;
pub mod output;
pub mod zip;

pub use cli::Cli;
pub use config::ExtractConfig;
pub use date::parse_target_date;
pub use error::ExtractError;
pub use extract::{ByteRange, Extractor, MatchSet, Partition, RunSummary, format_size};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use output::{MatchSink, OutputFile};
pub use zip::{LogStream, ZipFileEntry, ZipLogSource};
