//! Main entry point for the logslice CLI application.
//!
//! Opens the archive (local file or HTTP URL), locates the log member and
//! runs a parallel extraction of one date into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use logslice::logging::{default_filter, init_tracing};
use logslice::{
    Cli, Extractor, HttpRangeReader, LocalFileReader, OutputFile, ReadAt, RunSummary, ZipLogSource,
    format_size,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(default_filter(cli.quiet, cli.verbose));

    // Configuration problems surface before anything is opened
    let extractor = Extractor::new(cli.extract_config())?;

    if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(cli.input.clone()).await?);
        process_input(reader.clone(), &extractor, &cli).await?;

        if !cli.is_quiet() {
            eprintln!("Total bytes transferred: {}", format_size(reader.transferred_bytes()));
        }
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.input))
            .with_context(|| format!("cannot open {}", cli.input))?;
        process_input(Arc::new(reader), &extractor, &cli).await?;
    }

    Ok(())
}

/// Resolve the log stream of the input and extract from it.
async fn process_input<R: ReadAt + 'static>(reader: Arc<R>, extractor: &Extractor, cli: &Cli) -> Result<()> {
    if cli.plain {
        return extract_to_output(reader, extractor, cli).await;
    }

    let (member, stream) = ZipLogSource::new(reader)
        .open(cli.member.as_deref())
        .await
        .with_context(|| format!("cannot open log member of {}", cli.input))?;
    info!(member = %member.file_name, bytes = stream.size(), "scanning archive member");

    // The stream (and a spooled copy, if any) lives until the run is over
    extract_to_output(Arc::new(stream), extractor, cli).await
}

async fn extract_to_output<R: ReadAt + ?Sized + 'static>(
    source: Arc<R>,
    extractor: &Extractor,
    cli: &Cli,
) -> Result<()> {
    if !cli.is_quiet() {
        eprintln!("Processing logs for date {}...", cli.date);
    }

    let mut output = OutputFile::create(Path::new(&cli.output_dir), cli.date).await?;

    let summary = match extractor.run(source, cli.date, &mut output).await {
        Ok(summary) => summary,
        Err(e) => {
            let kept = output.abandon().await;
            return Err(e).with_context(|| {
                format!("extraction incomplete, partial output kept at {}", kept.display())
            });
        }
    };

    let path = output.commit().await?;

    if summary.malformed_records > 0 {
        warn!(count = summary.malformed_records, "skipped records without a leading date");
    }

    if !cli.is_quiet() {
        print_summary(&summary, cli.verbose > 0);
        if summary.matches_written == 0 {
            eprintln!("No logs found for date {}", cli.date);
        }
        eprintln!("Logs extracted successfully to {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, per_partition: bool) {
    eprintln!("{summary}");
    if !per_partition {
        return;
    }

    eprintln!("{:>5}  {:>24}  {:>10}  {:>10}  {:>9}  {:>8}", "Part", "Range", "Records", "Matches", "Malformed", "Time");
    eprintln!("{}", "-".repeat(76));
    for p in &summary.partitions {
        eprintln!(
            "{:>5}  {:>24}  {:>10}  {:>10}  {:>9}  {:>7.2}s",
            p.ordinal,
            p.range.to_string(),
            p.records,
            p.matches,
            p.malformed,
            p.elapsed.as_secs_f64()
        );
    }
}
