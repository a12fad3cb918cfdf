use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop an extraction run.
///
/// Per-image write failures are not represented here: the sink logs them and
/// moves on to the next image.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open container {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to seek to frame {index} (byte offset {offset}): {source}")]
    Seek {
        index: u64,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to read frame {index}: {source}")]
    Read {
        index: u64,
        #[source]
        source: io::Error,
    },

    #[error("frame {index} lies beyond the addressable range for a {frame_size} byte stride")]
    OffsetOverflow { index: u64, frame_size: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid frame selection {input:?}: {reason}")]
    InvalidSelection { input: String, reason: String },

    #[error("container path has no usable file name: {}", .0.display())]
    InvalidContainerPath(PathBuf),

    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
