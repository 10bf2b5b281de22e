use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};
use crate::io::ReadAt;
use crate::output::MatchSink;

use super::boundary;
use super::partition::{self, Partition};
use super::scanner::{ChunkScanner, MatchSet, PartitionStats};
use super::summary::RunSummary;

/// What a partition task hands back to the aggregator.
struct PartitionOutcome {
    ordinal: usize,
    result: Result<(MatchSet, PartitionStats)>,
}

/// Runs partition scans on a bounded pool and merges their matches in
/// stream order.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract every record dated `target` from `source` into `sink`.
    pub async fn run<R, S>(&self, source: Arc<R>, target: NaiveDate, sink: &mut S) -> Result<RunSummary>
    where
        R: ReadAt + ?Sized + 'static,
        S: MatchSink + ?Sized,
    {
        let partitions = partition::plan(source.size(), &self.config)?;
        info!(
            %target,
            bytes = source.size(),
            partitions = partitions.len(),
            workers = self.config.worker_count,
            "extraction started"
        );
        self.run_partitions(source, partitions, move |date| date == target, sink)
            .await
    }

    /// Scan explicit raw partitions, which must tile `[0, source.size())`.
    ///
    /// At most `worker_count` partitions are scanned at once; the rest wait
    /// for a free slot. The first failing partition cancels every task still
    /// queued or running, and matches already handed to `sink` stay there.
    /// Running partitions notice the cancellation before their next read,
    /// even when the source never yields to the runtime.
    pub async fn run_partitions<R, S, P>(
        &self,
        source: Arc<R>,
        partitions: Vec<Partition>,
        predicate: P,
        sink: &mut S,
    ) -> Result<RunSummary>
    where
        R: ReadAt + ?Sized + 'static,
        S: MatchSink + ?Sized,
        P: Fn(NaiveDate) -> bool + Send + Sync + 'static,
    {
        let started = Instant::now();
        partition::check_tiling(&partitions, source.size())?;

        let slots = Arc::new(Semaphore::new(self.config.worker_count));
        let predicate = Arc::new(predicate);
        let abort = CancellationToken::new();
        // Dropping the run future also stops partitions still scanning
        let _abort_on_drop = abort.clone().drop_guard();
        let scanner = ChunkScanner::new(self.config.read_buffer_size).with_cancellation(abort.clone());
        let buffer_size = self.config.read_buffer_size;

        let mut tasks = JoinSet::new();
        let mut task_ordinals = HashMap::with_capacity(partitions.len());

        for part in partitions {
            let source = source.clone();
            let slots = slots.clone();
            let predicate = predicate.clone();
            let scanner = scanner.clone();
            let abort = abort.clone();

            let handle = tasks.spawn(async move {
                let result = async {
                    let _slot = slots.acquire().await.map_err(|_| ExtractError::TaskFailed {
                        ordinal: part.ordinal,
                        reason: "worker pool closed".to_string(),
                    })?;
                    let resolved = boundary::resolve(source.as_ref(), &part, buffer_size, &abort).await?;
                    debug!(ordinal = part.ordinal, raw = %part.range, resolved = %resolved, "partition resolved");
                    scanner
                        .scan(source.as_ref(), part.ordinal, resolved, predicate.as_ref())
                        .await
                }
                .await;
                PartitionOutcome {
                    ordinal: part.ordinal,
                    result,
                }
            });
            task_ordinals.insert(handle.id(), part.ordinal);
        }

        let mut pending: BTreeMap<usize, MatchSet> = BTreeMap::new();
        let mut next_ordinal = 0;
        let mut stats = Vec::with_capacity(task_ordinals.len());

        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => {
                    let ordinal = task_ordinals.get(&e.id()).copied().unwrap_or_default();
                    PartitionOutcome {
                        ordinal,
                        result: Err(ExtractError::TaskFailed {
                            ordinal,
                            reason: e.to_string(),
                        }),
                    }
                }
            };

            let step = match outcome.result {
                Ok((matches, partition_stats)) => {
                    debug!(
                        ordinal = outcome.ordinal,
                        records = partition_stats.records,
                        matches = partition_stats.matches,
                        elapsed_ms = partition_stats.elapsed.as_millis() as u64,
                        "partition scanned"
                    );
                    stats.push(partition_stats);
                    pending.insert(outcome.ordinal, matches);
                    flush_ready(&mut pending, &mut next_ordinal, sink).await
                }
                Err(e) => Err(e),
            };

            if let Err(e) = step {
                error!(ordinal = ?e.ordinal(), error = %e, "aborting extraction");
                cancel(&mut tasks, &abort).await;
                return Err(e);
            }
        }

        debug_assert!(pending.is_empty());
        Ok(RunSummary::from_partitions(stats, started.elapsed()))
    }
}

/// Write every buffered match set whose predecessors are all written.
async fn flush_ready<S: MatchSink + ?Sized>(
    pending: &mut BTreeMap<usize, MatchSet>,
    next_ordinal: &mut usize,
    sink: &mut S,
) -> Result<()> {
    while let Some(matches) = pending.remove(next_ordinal) {
        sink.write_matches(&matches).await?;
        *next_ordinal += 1;
    }
    Ok(())
}

/// Abort queued and running partition tasks and wait until they are gone.
///
/// `abort_all` only takes effect at an await point that yields, which a
/// local or in-memory read never does, so running scans are also told
/// through `abort` to stop at their next read.
async fn cancel<T: 'static>(tasks: &mut JoinSet<T>, abort: &CancellationToken) {
    let remaining = tasks.len();
    abort.cancel();
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}
    if remaining > 0 {
        debug!(tasks = remaining, "cancelled outstanding partitions");
    }
}
