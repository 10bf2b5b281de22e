//! Output artifact handling.
//!
//! Matches are written to `<dir>/output_<date>.txt.partial` and renamed to
//! `<dir>/output_<date>.txt` only once the whole run succeeded. A file under
//! the final name is therefore always complete; a leftover `.partial` file
//! is the incomplete output of a failed run and is kept for inspection.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::extract::MatchSet;

/// Destination of matched records, owned by the aggregator.
#[async_trait]
pub trait MatchSink: Send {
    /// Append one partition's matches
    async fn write_matches(&mut self, matches: &MatchSet) -> Result<()>;
}

#[async_trait]
impl MatchSink for Vec<u8> {
    async fn write_matches(&mut self, matches: &MatchSet) -> Result<()> {
        self.extend_from_slice(matches.as_bytes());
        Ok(())
    }
}

/// Deterministic output file name for a target date
pub fn output_file_name(date: NaiveDate) -> String {
    format!("output_{}.txt", date.format("%Y-%m-%d"))
}

/// Output file written through a `.partial` staging name.
pub struct OutputFile {
    final_path: PathBuf,
    partial_path: PathBuf,
    writer: BufWriter<fs::File>,
}

impl OutputFile {
    /// Create the output directory if needed and open the staging file.
    pub async fn create(dir: &Path, date: NaiveDate) -> Result<Self> {
        let final_path = dir.join(output_file_name(date));
        let partial_path = partial_path(&final_path);

        fs::create_dir_all(dir).await.map_err(|source| ExtractError::SinkWrite {
            path: dir.to_path_buf(),
            source,
        })?;

        let file = fs::File::create(&partial_path)
            .await
            .map_err(|source| ExtractError::SinkWrite {
                path: partial_path.clone(),
                source,
            })?;
        debug!(path = %partial_path.display(), "output staged");

        Ok(Self {
            final_path,
            partial_path,
            writer: BufWriter::new(file),
        })
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    /// Flush, sync and move the staging file to its final name.
    pub async fn commit(mut self) -> Result<PathBuf> {
        let partial = self.partial_path.clone();
        let sink_err = |source| ExtractError::SinkWrite {
            path: partial.clone(),
            source,
        };

        self.writer.flush().await.map_err(sink_err)?;
        self.writer.get_ref().sync_all().await.map_err(sink_err)?;
        drop(self.writer);

        fs::rename(&self.partial_path, &self.final_path)
            .await
            .map_err(|source| ExtractError::SinkWrite {
                path: self.final_path.clone(),
                source,
            })?;
        Ok(self.final_path)
    }

    /// Give up on the run: flush what was written and keep the staging file.
    ///
    /// Returns the path of the incomplete output.
    pub async fn abandon(mut self) -> PathBuf {
        if let Err(e) = self.writer.flush().await {
            warn!(path = %self.partial_path.display(), error = %e, "failed to flush incomplete output");
        }
        self.partial_path
    }
}

#[async_trait]
impl MatchSink for OutputFile {
    async fn write_matches(&mut self, matches: &MatchSet) -> Result<()> {
        self.writer
            .write_all(matches.as_bytes())
            .await
            .map_err(|source| ExtractError::SinkWrite {
                path: self.partial_path.clone(),
                source,
            })
    }
}

fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    }

    #[test]
    fn file_name_follows_date() {
        assert_eq!(output_file_name(date()), "output_2024-12-01.txt");
    }

    #[tokio::test]
    async fn commit_renames_staging_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("output");

        let out = OutputFile::create(&dir, date()).await.unwrap();
        assert!(out.partial_path().exists());
        assert!(!out.final_path().exists());

        let path = out.commit().await.unwrap();
        assert_eq!(path, dir.join("output_2024-12-01.txt"));
        assert!(path.exists());
        assert!(!dir.join("output_2024-12-01.txt.partial").exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    #[tokio::test]
    async fn abandon_keeps_partial_output() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputFile::create(tmp.path(), date()).await.unwrap();
        let kept = out.abandon().await;
        assert!(kept.exists());
        assert!(kept.to_string_lossy().ends_with(".partial"));
        assert!(!tmp.path().join("output_2024-12-01.txt").exists());
    }
}
