use std::path::PathBuf;

use image::ImageFormat;

use crate::error::{ExtractError, Result};

/// Thumbnail width used by the player's full-size thumbnail database.
pub const DEFAULT_WIDTH: u32 = 720;
/// Thumbnail height used by the player's full-size thumbnail database.
pub const DEFAULT_HEIGHT: u32 = 480;

/// Frame dimensions and the number of bytes each frame record occupies in the container.
///
/// The stride is independent of the plane layout. Containers reserve `width * height * 2`
/// bytes per record even though the 4:2:0 planes only need `width * height * 3 / 2`;
/// the trailing bytes are skipped, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub frame_size: usize,
}

impl FrameGeometry {
    /// Geometry with the container's default stride of two bytes per pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_size: (width as usize)
                .saturating_mul(height as usize)
                .saturating_mul(2),
        }
    }

    pub fn with_frame_size(self, frame_size: usize) -> Self {
        Self { frame_size, ..self }
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length of the luma plane, which starts at offset 0.
    pub fn luma_len(&self) -> usize {
        self.pixels()
    }

    pub fn chroma_blue_offset(&self) -> usize {
        self.pixels()
    }

    pub fn chroma_red_offset(&self) -> usize {
        self.pixels() + self.pixels() / 4
    }

    /// Samples per row in each chroma plane.
    pub fn chroma_width(&self) -> usize {
        self.width as usize / 2
    }

    /// Bytes actually read by the decoder: luma plus both quarter-size chroma planes.
    pub fn planes_len(&self) -> usize {
        self.pixels() + self.pixels() / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "frame dimensions must be > 0, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "frame dimensions must be even for 4:2:0 chroma, got {}x{}",
                self.width, self.height
            )));
        }
        let default_stride = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(2));
        if default_stride.is_none() {
            return Err(ExtractError::InvalidConfig(format!(
                "frame dimensions {}x{} exceed the addressable frame size",
                self.width, self.height
            )));
        }
        if self.frame_size < self.planes_len() {
            return Err(ExtractError::InvalidConfig(format!(
                "frame size {} is smaller than the {} bytes of plane data for {}x{}",
                self.frame_size,
                self.planes_len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// Parameters for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub geometry: FrameGeometry,
    /// Capacity of every queue in the pipeline, data and event queues alike.
    pub queue_capacity: usize,
    /// Number of colour-conversion workers.
    pub decoder_workers: usize,
    /// Number of image-writing workers.
    pub writer_workers: usize,
    /// Directory under which the per-container output directory is created.
    pub output_root: PathBuf,
    /// Raster format for written frames; also decides the file extension.
    pub format: ImageFormat,
    /// Render the live status line.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::default(),
            queue_capacity: 100,
            decoder_workers: 5,
            writer_workers: 20,
            output_root: PathBuf::from("."),
            format: ImageFormat::Png,
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.queue_capacity == 0 {
            return Err(ExtractError::InvalidConfig(
                "queue capacity must be >= 1".to_string(),
            ));
        }
        if self.decoder_workers == 0 {
            return Err(ExtractError::InvalidConfig(
                "decoder pool needs at least one worker".to_string(),
            ));
        }
        if self.writer_workers == 0 {
            return Err(ExtractError::InvalidConfig(
                "writer pool needs at least one worker".to_string(),
            ));
        }
        Ok(())
    }

    /// Decoder pool size, clamped so no more workers exist than jobs can be queued.
    pub fn effective_decoder_workers(&self) -> usize {
        self.decoder_workers.min(self.queue_capacity)
    }
}
