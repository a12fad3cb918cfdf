use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{ImageError, ImageFormat, Rgb, RgbImage};
use ithmbrdr_core::sink::ImageWriter;
use ithmbrdr_core::{ExtractError, FrameGeometry, Pipeline, PipelineConfig, ProgressTotals};
use tempfile::TempDir;

fn geometry() -> FrameGeometry {
    FrameGeometry::new(4, 2)
}

/// Frame `i` has luma `10 * (i + 1) mod 256` everywhere and neutral chroma, so it decodes to a
/// uniform grey that identifies the frame.
fn frame_bytes(geometry: &FrameGeometry, i: u64) -> Vec<u8> {
    let mut data = vec![0xEE; geometry.frame_size];
    data[..geometry.luma_len()].fill(((i + 1) * 10 % 256) as u8);
    data[geometry.chroma_blue_offset()..geometry.planes_len()].fill(128);
    data
}

fn write_container(dir: &Path, name: &str, frames: u64, trailing: &[u8]) -> PathBuf {
    let geometry = geometry();
    let mut data = Vec::new();
    for i in 0..frames {
        data.extend(frame_bytes(&geometry, i));
    }
    data.extend_from_slice(trailing);

    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

fn config(root: &Path, decoders: usize, writers: usize) -> PipelineConfig {
    PipelineConfig {
        geometry: geometry(),
        queue_capacity: 2,
        decoder_workers: decoders,
        writer_workers: writers,
        output_root: root.to_path_buf(),
        format: ImageFormat::Png,
        show_progress: false,
    }
}

fn written_files(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn names(base: &str, indices: impl IntoIterator<Item = u64>) -> BTreeSet<String> {
    indices
        .into_iter()
        .map(|i| format!("{base}_{i}.png"))
        .collect()
}

fn settled(n: u64) -> ProgressTotals {
    ProgressTotals {
        queued: n,
        decoded: n,
        written: n,
    }
}

#[test]
fn three_frame_container_writes_three_files() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "base.ithmb", 3, &[]);

    let pipeline = Pipeline::new(config(tmp.path(), 5, 20)).unwrap();
    let report = pipeline.run(&container, 0..3).unwrap();

    assert_eq!(report.totals, settled(3));
    assert_eq!(report.totals.to_string(), "Written/Decoded/Queued: 3/3/3");
    assert_eq!(report.failed_writes, 0);
    assert_eq!(written_files(&tmp.path().join("base")), names("base", 0..3));

    let image = image::open(tmp.path().join("base/base_1.png")).unwrap().into_rgb8();
    assert_eq!(image.dimensions(), (4, 2));
    assert!(image.pixels().all(|p| *p == Rgb([20, 20, 20])));
}

#[test]
fn subrange_writes_only_requested_indices() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "F1_1.ithmb", 10, &[]);

    let pipeline = Pipeline::new(config(tmp.path(), 3, 4)).unwrap();
    let report = pipeline.run(&container, 4..8).unwrap();

    assert_eq!(report.totals, settled(4));
    assert_eq!(written_files(&tmp.path().join("F1_1")), names("F1_1", 4..8));

    // Seeking uses the full stride, so frame 6 decodes to its own grey level.
    let image = image::open(tmp.path().join("F1_1/F1_1_6.png")).unwrap().into_rgb8();
    assert_eq!(*image.get_pixel(0, 0), Rgb([70, 70, 70]));
}

#[test]
fn container_ending_early_stops_cleanly() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "short.ithmb", 5, &[1, 2, 3]);

    let pipeline = Pipeline::new(config(tmp.path(), 2, 2)).unwrap();
    let report = pipeline.run(&container, 2..u64::MAX).unwrap();

    assert_eq!(report.totals, settled(3));
    assert_eq!(written_files(&tmp.path().join("short")), names("short", 2..5));
}

#[test]
fn zero_length_range_terminates() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "empty.ithmb", 3, &[]);

    let pipeline = Pipeline::new(config(tmp.path(), 5, 20)).unwrap();
    let report = pipeline.run(&container, 2..2).unwrap();

    assert_eq!(report.totals, settled(0));
    assert!(written_files(&tmp.path().join("empty")).is_empty());
}

#[test]
fn empty_container_terminates() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "none.ithmb", 0, &[]);

    let pipeline = Pipeline::new(config(tmp.path(), 1, 1)).unwrap();
    let report = pipeline.run(&container, 0..u64::MAX).unwrap();

    assert_eq!(report.totals, settled(0));
}

#[test]
fn single_worker_pools_lose_nothing() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "solo.ithmb", 12, &[]);

    let mut config = config(tmp.path(), 1, 1);
    config.queue_capacity = 1;
    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline.run(&container, 0..u64::MAX).unwrap();

    assert_eq!(report.totals, settled(12));
    assert_eq!(written_files(&tmp.path().join("solo")), names("solo", 0..12));
}

#[test]
fn many_workers_lose_nothing() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "busy.ithmb", 40, &[]);

    let pipeline = Pipeline::new(config(tmp.path(), 8, 8)).unwrap();
    let report = pipeline.run(&container, 0..u64::MAX).unwrap();

    assert!(report.totals.is_settled());
    assert_eq!(report.totals.written, 40);
    assert_eq!(written_files(&tmp.path().join("busy")), names("busy", 0..40));
}

/// Writes nothing to disk; fails for a fixed set of indices and records the rest.
struct FlakyWriter {
    fail: BTreeSet<String>,
    saved: Mutex<BTreeSet<String>>,
}

impl ImageWriter for FlakyWriter {
    fn write(&self, path: &Path, _image: &RgbImage) -> Result<(), ImageError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.fail.contains(&name) {
            return Err(ImageError::IoError(io::Error::other("disk full")));
        }
        self.saved.lock().unwrap().insert(name);
        Ok(())
    }
}

#[test]
fn write_failures_do_not_stall_the_pipeline() {
    let tmp = TempDir::new().unwrap();
    let container = write_container(tmp.path(), "flaky.ithmb", 6, &[]);

    let writer = FlakyWriter {
        fail: names("flaky", [1, 4]),
        saved: Mutex::new(BTreeSet::new()),
    };
    let pipeline = Pipeline::with_writer(config(tmp.path(), 2, 3), writer).unwrap();
    let report = pipeline.run(&container, 0..6).unwrap();

    assert_eq!(report.totals, settled(6));
    assert_eq!(report.failed_writes, 2);
    assert_eq!(
        *pipeline.writer().saved.lock().unwrap(),
        names("flaky", [0, 2, 3, 5])
    );
}

#[test]
fn missing_container_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let pipeline = Pipeline::new(config(tmp.path(), 1, 1)).unwrap();

    let err = pipeline
        .run(&tmp.path().join("absent.ithmb"), 0..1)
        .unwrap_err();
    assert!(matches!(err, ExtractError::Open { .. }));
    assert!(!tmp.path().join("absent").exists());
}

#[test]
#[cfg(target_os = "linux")]
fn read_failure_aborts_the_whole_run() {
    let tmp = TempDir::new().unwrap();
    // Opening a directory succeeds on Linux, but reading from it fails with EISDIR.
    let container = tmp.path().join("adir.ithmb");
    std::fs::create_dir(&container).unwrap();

    let mut config = config(tmp.path(), 2, 2);
    config.queue_capacity = 1;
    let pipeline = Pipeline::new(config).unwrap();

    let err = pipeline.run(&container, 0..10).unwrap_err();
    assert!(matches!(err, ExtractError::Read { index: 0, .. }), "got {err:?}");
    assert!(written_files(&tmp.path().join("adir")).is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut config = config(tmp.path(), 1, 1);
    config.geometry = FrameGeometry::new(4, 2).with_frame_size(4);
    assert!(matches!(
        Pipeline::new(config),
        Err(ExtractError::InvalidConfig(_))
    ));
}
