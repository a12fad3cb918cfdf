use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{Receiver, Sender};
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::color::ycbcr_to_rgb;
use crate::config::FrameGeometry;
use crate::frame::{DecodedImage, Frame};

/// Decode a planar 4:2:0 frame record into an RGB image.
///
/// Each chroma sample covers a 2x2 block of luma samples (nearest neighbour, no
/// interpolation). Bytes past the three planes are ignored.
pub fn decode_frame(data: &[u8], geometry: &FrameGeometry) -> RgbImage {
    assert!(
        data.len() >= geometry.planes_len(),
        "frame buffer holds {} bytes, planes need {}",
        data.len(),
        geometry.planes_len()
    );

    let width = geometry.width as usize;
    let chroma_width = geometry.chroma_width();
    let cb_plane = &data[geometry.chroma_blue_offset()..geometry.chroma_red_offset()];
    let cr_plane = &data[geometry.chroma_red_offset()..geometry.planes_len()];

    RgbImage::from_fn(geometry.width, geometry.height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let luma = data[y * width + x];
        let chroma = (y / 2) * chroma_width + x / 2;
        ycbcr_to_rgb(luma, cb_plane[chroma], cr_plane[chroma])
    })
}

/// Decoder pool worker: converts frames until the job queue is closed and drained.
///
/// The index is announced on `decoded` before the image is handed to `results`.
pub fn run_decoder(
    worker: usize,
    geometry: FrameGeometry,
    jobs: Receiver<Frame>,
    results: Sender<DecodedImage>,
    decoded: Sender<u64>,
    abort: &AtomicBool,
) -> u64 {
    let mut count = 0;

    for frame in jobs.iter() {
        if abort.load(Ordering::SeqCst) {
            debug!(worker, "abort raised, decoder stopping");
            break;
        }

        let image = decode_frame(&frame.data, &geometry);
        debug!(worker, index = frame.index, "decoded frame");

        if decoded.send(frame.index).is_err() {
            debug!(index = frame.index, "progress tracker gone, decoded event dropped");
        }
        if results
            .send(DecodedImage {
                index: frame.index,
                image,
            })
            .is_err()
        {
            warn!(worker, index = frame.index, "result queue has no consumers, decoder stopping");
            break;
        }
        count += 1;
    }

    info!(worker, frames = count, "decoder finished");
    count
}
