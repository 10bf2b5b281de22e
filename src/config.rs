use crate::error::{ExtractError, Result};

/// Default floor below which a stream is not split further (4 MiB)
pub const DEFAULT_MIN_CHUNK_BYTES: u64 = 4 * 1024 * 1024;

/// Default per-worker read buffer (1 MiB)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Tuning knobs of an extraction run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Maximum number of partitions scanned at the same time
    pub worker_count: usize,
    /// Minimum partition size; small inputs get fewer partitions
    pub min_chunk_bytes: u64,
    /// Bytes fetched from the source per read
    pub read_buffer_size: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            min_chunk_bytes: DEFAULT_MIN_CHUNK_BYTES,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ExtractError::config("worker count must be at least 1"));
        }
        if self.min_chunk_bytes == 0 {
            return Err(ExtractError::config("minimum chunk size must be at least 1 byte"));
        }
        if self.read_buffer_size == 0 {
            return Err(ExtractError::config("read buffer size must be at least 1 byte"));
        }
        Ok(())
    }
}

/// Parse a byte size such as `4096`, `64K`, `4M` or `1G` (binary units).
pub fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let (digits, shift) = match s.char_indices().last() {
        Some((i, 'k' | 'K')) => (&s[..i], 10),
        Some((i, 'm' | 'M')) => (&s[..i], 20),
        Some((i, 'g' | 'G')) => (&s[..i], 30),
        _ => (s, 0),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{s}': expected bytes or a K/M/G suffix"))?;
    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| format!("size '{s}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ExtractConfig::default();
        assert!(config.worker_count >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_values() {
        let zero_workers = ExtractConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_workers.validate(),
            Err(ExtractError::InvalidConfiguration(_))
        ));

        let zero_buffer = ExtractConfig {
            read_buffer_size: 0,
            ..Default::default()
        };
        assert!(zero_buffer.validate().is_err());
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("4096"), Ok(4096));
        assert_eq!(parse_size("64K"), Ok(64 * 1024));
        assert_eq!(parse_size("4m"), Ok(4 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Ok(1 << 30));
        assert!(parse_size("").is_err());
        assert!(parse_size("12X").is_err());
        assert!(parse_size("99999999999G").is_err());
    }
}
