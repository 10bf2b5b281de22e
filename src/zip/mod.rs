//! ZIP archive access.
//!
//! The archive is read from its end (EOCD, optional ZIP64 records, Central
//! Directory), the log member is chosen, and its decompressed bytes are
//! exposed as a [`ReadAt`](crate::io::ReadAt) source:
//!
//! - STORED members are served directly from the archive reader, so workers
//!   issue positioned reads into the archive itself.
//! - DEFLATE members cannot be entered at arbitrary offsets, so they are
//!   inflated once into an anonymous temporary file that then serves reads.
//!
//! Encryption, multi-disk archives and methods other than STORED/DEFLATE
//! are rejected.

mod member;
mod parser;
mod structures;

pub use member::{EntryWindow, LogStream, ZipLogSource, select_log_member};
pub use parser::ZipParser;
pub use structures::*;
