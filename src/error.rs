use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of an extraction run.
///
/// Per-record problems never show up here; malformed records are counted
/// in the run summary instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("partition {ordinal} failed reading source at offset {offset}: {cause:#}")]
    SourceRead {
        ordinal: usize,
        offset: u64,
        cause: anyhow::Error,
    },

    #[error("partition {ordinal} cancelled")]
    Cancelled { ordinal: usize },

    #[error("partition {ordinal} task failed: {reason}")]
    TaskFailed { ordinal: usize, reason: String },

    #[error("failed writing output {}: {source}", .path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    pub fn config(msg: impl Into<String>) -> Self {
        ExtractError::InvalidConfiguration(msg.into())
    }

    /// Partition ordinal the failure is attributed to, if any
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            ExtractError::SourceRead { ordinal, .. }
            | ExtractError::Cancelled { ordinal }
            | ExtractError::TaskFailed { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
