//! Extraction pipeline: container reader, decoder pool, writer pool and progress tracker.
//!
//! ```text
//! FrameSource --jobs--> decoders (P) --results--> writers (W)
//!      |                    |                        |
//!   queued               decoded                  written
//!      \____________________|________________________/
//!                           v
//!                    ProgressTracker
//! ```
//!
//! Shutdown is driven purely by queue closure. The source closes `jobs` and `queued` when
//! it stops. A supervisor joins the decoders and then closes `results` and `decoded`.
//! A second supervisor joins the writers and then closes `written`. The tracker returns
//! once all three event queues are closed, which ends the run.

use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, ScopedJoinHandle};

use crossbeam::channel;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::decoder::run_decoder;
use crate::error::{ExtractError, Result};
use crate::frame::{DecodedImage, Frame};
use crate::output::OutputLayout;
use crate::progress::{ProgressTotals, ProgressTracker};
use crate::sink::{run_sink, FileImageWriter, ImageWriter};
use crate::source::FrameSource;

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub totals: ProgressTotals,
    /// Images whose write failed. They are still counted as written.
    pub failed_writes: u64,
}

/// A configured extraction pipeline.
pub struct Pipeline<W = FileImageWriter> {
    config: PipelineConfig,
    writer: W,
}

impl Pipeline<FileImageWriter> {
    /// Pipeline writing files in the configured format.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let writer = FileImageWriter::new(config.format);
        Self::with_writer(config, writer)
    }
}

impl<W: ImageWriter> Pipeline<W> {
    pub fn with_writer(config: PipelineConfig, writer: W) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, writer })
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Output layout for a container under the configured output root.
    pub fn layout_for(&self, container: &Path) -> Result<OutputLayout> {
        OutputLayout::for_container(container, &self.config.output_root, self.config.format)
    }

    /// Extract frames `range` of `container` into the container's output directory.
    ///
    /// Stops cleanly at the end of the range or of the container. Failing to open or
    /// seek the container returns before any worker starts; a read error part way
    /// through stops every stage and is returned once the pipeline has drained.
    pub fn run(&self, container: &Path, range: Range<u64>) -> Result<PipelineReport> {
        let geometry = self.config.geometry;
        let capacity = self.config.queue_capacity;
        let decoders = self.config.effective_decoder_workers();
        let writers = self.config.writer_workers;

        let layout = self.layout_for(container)?;
        let source = FrameSource::open(container, geometry.frame_size, range.clone())?;
        layout.ensure_dir()?;

        info!(
            ?container,
            start = range.start,
            end = range.end,
            width = geometry.width,
            height = geometry.height,
            frame_size = geometry.frame_size,
            capacity,
            decoders,
            writers,
            "pipeline starting"
        );

        let (job_tx, job_rx) = channel::bounded::<Frame>(capacity);
        let (result_tx, result_rx) = channel::bounded::<DecodedImage>(capacity);
        let (queued_tx, queued_rx) = channel::bounded::<u64>(capacity);
        let (decoded_tx, decoded_rx) = channel::bounded::<u64>(capacity);
        let (written_tx, written_rx) = channel::bounded::<u64>(capacity);

        let tracker = if self.config.show_progress {
            ProgressTracker::with_status_line()
        } else {
            ProgressTracker::hidden()
        };

        let abort = AtomicBool::new(false);
        let failures = AtomicU64::new(0);
        let abort = &abort;
        let failures = &failures;
        let layout = &layout;
        let writer = &self.writer;

        let (totals, source_result, decode_result, write_result) = thread::scope(|s| {
            let tracker = s.spawn(move || tracker.run(queued_rx, decoded_rx, written_rx));

            let decoder_handles: Vec<_> = (0..decoders)
                .map(|worker| {
                    let jobs = job_rx.clone();
                    let results = result_tx.clone();
                    let decoded = decoded_tx.clone();
                    s.spawn(move || run_decoder(worker, geometry, jobs, results, decoded, abort))
                })
                .collect();
            drop(job_rx);

            let writer_handles: Vec<_> = (0..writers)
                .map(|worker| {
                    let results = result_rx.clone();
                    let written = written_tx.clone();
                    s.spawn(move || {
                        run_sink(worker, writer, layout, results, written, failures, abort)
                    })
                })
                .collect();
            drop(result_rx);

            // Owns the pool's downstream senders; dropping them after the join is the
            // single point where `results` and `decoded` close.
            let decode_supervisor = s.spawn(move || {
                let joined = join_pool("decoder", decoder_handles);
                drop(result_tx);
                drop(decoded_tx);
                joined
            });

            let write_supervisor = s.spawn(move || {
                let joined = join_pool("writer", writer_handles);
                drop(written_tx);
                joined
            });

            let source = s.spawn(move || source.run(job_tx, queued_tx, abort));

            let totals = tracker.join().map_err(|_| ExtractError::WorkerPanicked("progress"));
            let source_result = source
                .join()
                .unwrap_or_else(|_| Err(ExtractError::WorkerPanicked("source")));
            let decode_result = decode_supervisor
                .join()
                .unwrap_or_else(|_| Err(ExtractError::WorkerPanicked("decoder")));
            let write_result = write_supervisor
                .join()
                .unwrap_or_else(|_| Err(ExtractError::WorkerPanicked("writer")));

            (totals, source_result, decode_result, write_result)
        });

        if let Err(e) = &source_result {
            error!(error = %e, "frame source failed, extraction aborted");
        }
        source_result?;
        decode_result?;
        write_result?;
        let totals = totals?;

        let report = PipelineReport {
            totals,
            failed_writes: failures.load(Ordering::Relaxed),
        };
        info!(
            queued = totals.queued,
            decoded = totals.decoded,
            written = totals.written,
            failed_writes = report.failed_writes,
            "pipeline complete"
        );
        Ok(report)
    }
}

/// Join every worker of a pool, returning the number of items it processed.
fn join_pool(stage: &'static str, handles: Vec<ScopedJoinHandle<'_, u64>>) -> Result<u64> {
    let mut total = 0;
    let mut panicked = false;
    for handle in handles {
        match handle.join() {
            Ok(count) => total += count,
            Err(_) => {
                error!(stage, "worker panicked");
                panicked = true;
            }
        }
    }
    if panicked {
        return Err(ExtractError::WorkerPanicked(stage));
    }
    Ok(total)
}
