//! Extraction of thumbnail frames from fixed-record `.ithmb` thumbnail databases.
//!
//! A container is a flat sequence of equally sized frame records, each holding a planar
//! 4:2:0 YCbCr image. [`pipeline::Pipeline`] reads the records in order, converts them to
//! RGB on a pool of decoder threads and writes one image file per frame on a pool of
//! writer threads.

pub mod color;
pub mod config;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod selection;
pub mod sink;
pub mod source;

pub use config::{FrameGeometry, PipelineConfig};
pub use error::ExtractError;
pub use pipeline::{Pipeline, PipelineReport};
pub use progress::ProgressTotals;
pub use selection::FrameSelection;
