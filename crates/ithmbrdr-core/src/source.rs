use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::Sender;
use tracing::{debug, error, info, warn};

use crate::error::{ExtractError, Result};
use crate::frame::Frame;

/// Sequential reader of fixed-size frame records.
///
/// The only component that touches the container. Records are read in index order,
/// starting at the first index of the requested range.
pub struct FrameSource<R> {
    reader: R,
    frame_size: usize,
    next_index: u64,
    end: u64,
}

impl FrameSource<File> {
    /// Open a container and position it at the first requested frame.
    pub fn open(path: &Path, frame_size: usize, range: Range<u64>) -> Result<Self> {
        info!(?path, frame_size, start = range.start, end = range.end, "opening container");
        let file = File::open(path).map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file, frame_size, range)
    }
}

impl<R: Read + Seek> FrameSource<R> {
    pub fn new(mut reader: R, frame_size: usize, range: Range<u64>) -> Result<Self> {
        let offset = range
            .start
            .checked_mul(frame_size as u64)
            .ok_or(ExtractError::OffsetOverflow {
                index: range.start,
                frame_size,
            })?;

        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|source| ExtractError::Seek {
                index: range.start,
                offset,
                source,
            })?;

        Ok(Self {
            reader,
            frame_size,
            next_index: range.start,
            end: range.end,
        })
    }

    /// Read the next frame, or `None` once the range or the container is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next_index >= self.end {
            debug!(end = self.end, "requested range exhausted");
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_size];
        let mut read = 0;

        while read < self.frame_size {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) => {
                    if read == 0 {
                        info!(next_index = self.next_index, "container ended");
                    } else {
                        warn!(
                            index = self.next_index,
                            read_bytes = read,
                            expected_bytes = self.frame_size,
                            "container ends with a truncated frame, ignoring it"
                        );
                    }
                    // A short record is never handed out, and nothing after it is read.
                    self.end = self.next_index;
                    return Ok(None);
                }
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(index = self.next_index, %e, "failed to read frame");
                    return Err(ExtractError::Read {
                        index: self.next_index,
                        source: e,
                    });
                }
            }
        }

        let index = self.next_index;
        self.next_index += 1;
        debug!(index, "read frame");

        Ok(Some(Frame { index, data: buf }))
    }

    /// Push every remaining frame onto `jobs`, announcing each index on `queued`.
    ///
    /// Both queues are closed when this returns, since their senders are consumed.
    /// On a read error, `abort` is raised before returning so downstream stages stop
    /// taking new work.
    pub fn run(
        mut self,
        jobs: Sender<Frame>,
        queued: Sender<u64>,
        abort: &AtomicBool,
    ) -> Result<u64> {
        let mut count = 0;

        loop {
            let frame = match self.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    abort.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            };

            let index = frame.index;
            if jobs.send(frame).is_err() {
                warn!(index, "job queue has no consumers, stopping source");
                break;
            }
            if queued.send(index).is_err() {
                debug!(index, "progress tracker gone, queued event dropped");
            }
            count += 1;
        }

        info!(frames = count, "frame source finished");
        Ok(count)
    }
}
