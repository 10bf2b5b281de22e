use chrono::NaiveDate;
use clap::Parser;

use crate::config::{DEFAULT_MIN_CHUNK_BYTES, DEFAULT_READ_BUFFER_SIZE, ExtractConfig, parse_size};
use crate::date::parse_target_date;

#[derive(Parser, Debug)]
#[command(name = "logslice")]
#[command(version)]
#[command(about = "Extract all log records of one date from a huge log inside a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  logslice 2024-12-01                          scan ./logs.zip, write output/output_2024-12-01.txt\n  \
  logslice 2024-12-01 -i https://host/logs.zip read a remote archive with Range requests\n  \
  logslice 2024-12-01 -i app.log --plain -j 8  scan an uncompressed log with 8 workers")]
pub struct Cli {
    /// Date to extract, YYYY-MM-DD
    #[arg(value_name = "DATE", value_parser = parse_date_arg)]
    pub date: NaiveDate,

    /// ZIP archive path or HTTP URL
    #[arg(short = 'i', long = "input", value_name = "FILE", default_value = "logs.zip")]
    pub input: String,

    /// Directory for the output file (created if missing)
    #[arg(short = 'd', long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: String,

    /// Archive member to scan (default: first .log/.txt file)
    #[arg(long = "member", value_name = "NAME")]
    pub member: Option<String>,

    /// Input is an uncompressed log, not a ZIP archive
    #[arg(long = "plain")]
    pub plain: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short = 'j', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Smallest partition worth a separate worker, e.g. 4M
    #[arg(long = "min-chunk-size", value_name = "SIZE", value_parser = parse_size)]
    pub min_chunk_size: Option<u64>,

    /// Per-worker read buffer, e.g. 1M
    #[arg(long = "buffer-size", value_name = "SIZE", value_parser = parse_size)]
    pub buffer_size: Option<u64>,

    /// Quiet mode, errors only
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Verbose mode (-v => per-partition table, -vv => debug events)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Extraction settings: defaults overridden by flags
    pub fn extract_config(&self) -> ExtractConfig {
        let defaults = ExtractConfig::default();
        ExtractConfig {
            worker_count: self.workers.unwrap_or(defaults.worker_count),
            min_chunk_bytes: self.min_chunk_size.unwrap_or(DEFAULT_MIN_CHUNK_BYTES),
            read_buffer_size: self
                .buffer_size
                .map(|b| usize::try_from(b).unwrap_or(usize::MAX))
                .unwrap_or(DEFAULT_READ_BUFFER_SIZE),
        }
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_target_date(s).map_err(|_| "invalid date format, use YYYY-MM-DD".to_string())
}
