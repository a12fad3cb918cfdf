use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam::channel::{Receiver, Sender};
use image::{ImageError, ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::frame::DecodedImage;
use crate::output::OutputLayout;

/// Serializes one decoded image to a file.
pub trait ImageWriter: Send + Sync {
    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), ImageError>;
}

/// Writes images to disk with the `image` crate's encoders.
#[derive(Debug, Clone, Copy)]
pub struct FileImageWriter {
    format: ImageFormat,
}

impl FileImageWriter {
    pub fn new(format: ImageFormat) -> Self {
        Self { format }
    }
}

impl ImageWriter for FileImageWriter {
    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), ImageError> {
        image.save_with_format(path, self.format)
    }
}

/// Writer pool worker: saves images until the result queue is closed and drained.
///
/// A failed write is logged and counted in `failures`; its index is still announced on
/// `written` so progress accounting stays complete.
pub fn run_sink<W: ImageWriter + ?Sized>(
    worker: usize,
    writer: &W,
    layout: &OutputLayout,
    results: Receiver<DecodedImage>,
    written: Sender<u64>,
    failures: &AtomicU64,
    abort: &AtomicBool,
) -> u64 {
    let mut count = 0;

    for decoded in results.iter() {
        if abort.load(Ordering::SeqCst) {
            debug!(worker, "abort raised, writer stopping");
            break;
        }

        let path = layout.path_for(decoded.index);
        match writer.write(&path, &decoded.image) {
            Ok(()) => debug!(worker, index = decoded.index, ?path, "wrote image"),
            Err(e) => {
                warn!(worker, index = decoded.index, ?path, error = %e, "failed to save image");
                failures.fetch_add(1, Ordering::Relaxed);
            }
        }

        if written.send(decoded.index).is_err() {
            debug!(index = decoded.index, "progress tracker gone, written event dropped");
        }
        count += 1;
    }

    info!(worker, images = count, "writer finished");
    count
}
