use std::fmt;
use std::time::Duration;

use super::scanner::PartitionStats;

/// Totals of a completed extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Per-partition counters, by ascending ordinal
    pub partitions: Vec<PartitionStats>,
    pub records_scanned: u64,
    pub matches_written: u64,
    pub malformed_records: u64,
    pub bytes_scanned: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub(crate) fn from_partitions(mut partitions: Vec<PartitionStats>, elapsed: Duration) -> Self {
        partitions.sort_by_key(|p| p.ordinal);
        let mut summary = Self {
            elapsed,
            ..Default::default()
        };
        for p in &partitions {
            summary.records_scanned += p.records;
            summary.matches_written += p.matches;
            summary.malformed_records += p.malformed;
            summary.bytes_scanned += p.range.len();
        }
        summary.partitions = partitions;
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records scanned ({}) in {} partitions, {} matched, {} malformed, {:.2}s",
            self.records_scanned,
            format_size(self.bytes_scanned),
            self.partitions.len(),
            self.matches_written,
            self.malformed_records,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Format a byte size into a human-readable string.
///
/// ```
/// use logslice::format_size;
///
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
