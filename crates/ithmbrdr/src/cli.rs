use std::path::PathBuf;

use clap::Parser;
use image::ImageFormat;

use ithmbrdr_core::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use ithmbrdr_core::FrameSelection;

#[derive(Parser)]
#[command(name = "ithmbrdr", about = "Extract thumbnails from iPod .ithmb thumbnail databases")]
pub struct Cli {
    /// Frames to extract: `*` for all, a single index, or an inclusive range such as 2-10.
    #[arg(value_parser = parse_selection)]
    pub id: FrameSelection,

    /// Path to the .ithmb container.
    pub filename: PathBuf,

    /// Capacity of every queue between pipeline stages.
    #[arg(short = 'c', long = "channel-size", default_value_t = 100)]
    pub channel_size: usize,

    /// Number of colour-conversion workers (clamped to the channel size).
    #[arg(long, default_value_t = 5)]
    pub decoders: usize,

    /// Number of image-writing workers.
    #[arg(long, default_value_t = 20)]
    pub writers: usize,

    /// Thumbnail width in pixels.
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Thumbnail height in pixels.
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Bytes reserved per frame in the container (default: width * height * 2).
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Output image format, by file extension.
    #[arg(long, default_value = "png", value_parser = parse_format)]
    pub format: ImageFormat,

    /// Directory in which the per-container output directory is created.
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Do not draw the live status line.
    #[arg(long)]
    pub no_progress: bool,
}

fn parse_selection(s: &str) -> Result<FrameSelection, String> {
    s.parse().map_err(|e: ithmbrdr_core::ExtractError| e.to_string())
}

fn parse_format(s: &str) -> Result<ImageFormat, String> {
    ImageFormat::from_extension(s).ok_or_else(|| format!("unknown image format: {s}"))
}
