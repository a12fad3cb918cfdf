mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use ithmbrdr_core::{FrameGeometry, Pipeline, PipelineConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let mut geometry = FrameGeometry::new(cli.width, cli.height);
    if let Some(frame_size) = cli.frame_size {
        geometry = geometry.with_frame_size(frame_size);
    }

    let config = PipelineConfig {
        geometry,
        queue_capacity: cli.channel_size,
        decoder_workers: cli.decoders,
        writer_workers: cli.writers,
        output_root: cli.out_dir,
        format: cli.format,
        show_progress: !cli.no_progress,
    };
    info!(channel_size = config.queue_capacity, "using channel size");

    let pipeline = Pipeline::new(config).context("invalid pipeline configuration")?;

    let path = std::path::absolute(&cli.filename)
        .with_context(|| format!("failed to resolve {}", cli.filename.display()))?;
    info!(?path, "reading container");

    let layout = pipeline.layout_for(&path)?;
    info!(name = layout.base_name(), dir = ?layout.dir(), "output location");

    let range = cli.id.range();
    info!(selection = %cli.id, start = range.start, end = range.end, "frame selection");

    let report = pipeline
        .run(&path, range)
        .with_context(|| format!("failed to extract {}", path.display()))?;

    if report.failed_writes > 0 {
        warn!(
            failed_writes = report.failed_writes,
            "some images could not be written"
        );
    }

    info!(
        written = report.totals.written,
        decoded = report.totals.decoded,
        queued = report.totals.queued,
        "extraction complete"
    );

    Ok(())
}
