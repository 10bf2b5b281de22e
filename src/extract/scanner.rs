use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::date::record_date;
use crate::error::{ExtractError, Result};
use crate::io::ReadAt;

use super::boundary::SEPARATOR;
use super::partition::ByteRange;
use super::{ensure_running, read_chunk};

/// Matched records of one partition, in stream order.
///
/// Records are kept back to back, each terminated by a newline, which is
/// also the layout of the output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    pub ordinal: usize,
    data: Vec<u8>,
    count: u64,
}

impl MatchSet {
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            ..Default::default()
        }
    }

    /// Append a record verbatim, terminating it if the stream did not.
    fn push(&mut self, record: &[u8]) {
        self.data.extend_from_slice(record);
        if record.last() != Some(&SEPARATOR) {
            self.data.push(SEPARATOR);
        }
        self.count += 1;
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Newline-terminated records, ready to be written out
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Counters of one scanned partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionStats {
    pub ordinal: usize,
    pub range: ByteRange,
    pub records: u64,
    pub matches: u64,
    pub malformed: u64,
    pub elapsed: Duration,
}

/// Streams a resolved range and keeps the records whose date passes a
/// predicate.
///
/// Memory stays at one read buffer plus the longest record, whatever the
/// size of the range. A scan gives up with [`ExtractError::Cancelled`] at
/// the next read once its cancellation token fires.
#[derive(Debug, Clone)]
pub struct ChunkScanner {
    buffer_size: usize,
    cancel: CancellationToken,
}

impl ChunkScanner {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn scan<R, P>(
        &self,
        source: &R,
        ordinal: usize,
        range: ByteRange,
        predicate: P,
    ) -> Result<(MatchSet, PartitionStats)>
    where
        R: ReadAt + ?Sized,
        P: Fn(NaiveDate) -> bool,
    {
        let started = Instant::now();
        let mut state = ScanState {
            matches: MatchSet::new(ordinal),
            records: 0,
            malformed: 0,
            predicate,
        };

        let mut buf = vec![0u8; (self.buffer_size as u64).min(range.len()) as usize];
        // Partial record carried over from the previous read
        let mut carry: Vec<u8> = Vec::new();
        let mut record_offset = range.start;
        let mut pos = range.start;

        while pos < range.end {
            ensure_running(&self.cancel, ordinal)?;
            let want = (range.end - pos).min(buf.len() as u64) as usize;
            let n = read_chunk(source, ordinal, pos, &mut buf[..want]).await?;
            if n == 0 {
                return Err(ExtractError::SourceRead {
                    ordinal,
                    offset: pos,
                    cause: anyhow::anyhow!(
                        "stream ended before the end of range {range} (source reports {} bytes)",
                        source.size()
                    ),
                });
            }

            let chunk = &buf[..n];
            let mut line_start = 0;
            for i in chunk
                .iter()
                .enumerate()
                .filter_map(|(i, &b)| (b == SEPARATOR).then_some(i))
            {
                let piece = &chunk[line_start..=i];
                if carry.is_empty() {
                    state.visit(piece, record_offset);
                } else {
                    carry.extend_from_slice(piece);
                    state.visit(&carry, record_offset);
                    carry.clear();
                }
                line_start = i + 1;
                record_offset = pos + line_start as u64;
            }
            carry.extend_from_slice(&chunk[line_start..]);
            pos += n as u64;
        }

        // Last record of the stream may lack its newline
        if !carry.is_empty() {
            state.visit(&carry, record_offset);
        }

        let stats = PartitionStats {
            ordinal,
            range,
            records: state.records,
            matches: state.matches.len(),
            malformed: state.malformed,
            elapsed: started.elapsed(),
        };
        Ok((state.matches, stats))
    }
}

struct ScanState<P> {
    matches: MatchSet,
    records: u64,
    malformed: u64,
    predicate: P,
}

impl<P: Fn(NaiveDate) -> bool> ScanState<P> {
    fn visit(&mut self, record: &[u8], offset: u64) {
        self.records += 1;

        let body = record.strip_suffix(b"\n").unwrap_or(record);
        let body = body.strip_suffix(b"\r").unwrap_or(body);

        match record_date(body) {
            Some(date) => {
                if (self.predicate)(date) {
                    self.matches.push(record);
                }
            }
            None => {
                self.malformed += 1;
                debug!(ordinal = self.matches.ordinal, offset, "skipping record without a leading date");
            }
        }
    }
}
