//! Extraction loop tests.
//!
//! These drive `extract_from_source` with a scripted in-memory source, so
//! they need no fixture files.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use framegrab::{
    ExtractOptions, FailureKind, FrameGrabError, FrameOutcome, FrameOutputOptions, FrameSource,
    ImageFormat, MAX_IMAGE_COUNT, ProgressCallback, ProgressInfo, VideoMetadata,
    extract_from_source,
};
use image::{DynamicImage, Rgb32FImage, RgbImage};

/// What the scripted source does for one timestamp.
#[derive(Clone, Copy)]
enum Step {
    Frame,
    EndOfStream,
    SeekError,
    DecodeError,
    /// A frame the JPEG encoder cannot write: float samples, and wider than
    /// the format's 16-bit dimension limit.
    Unencodable,
}

struct ScriptedSource {
    metadata: VideoMetadata,
    path: PathBuf,
    steps: VecDeque<Step>,
    current: Option<Step>,
    seeks: Arc<Mutex<Vec<Duration>>>,
    released: Arc<AtomicBool>,
}

impl ScriptedSource {
    fn new(frame_count: u64, frames_per_second: f64, steps: &[Step]) -> Self {
        Self {
            metadata: VideoMetadata {
                width: 8,
                height: 6,
                frames_per_second,
                frame_count,
                codec: "scripted".to_string(),
                container_duration: Duration::ZERO,
            },
            path: PathBuf::from("scripted.mp4"),
            steps: steps.iter().copied().collect(),
            current: None,
            seeks: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn seek(&mut self, timestamp: Duration) -> Result<(), FrameGrabError> {
        self.seeks.lock().unwrap().push(timestamp);
        self.current = Some(self.steps.pop_front().unwrap_or(Step::Frame));
        match self.current {
            Some(Step::SeekError) => Err(FrameGrabError::FfmpegError("seek refused".to_string())),
            _ => Ok(()),
        }
    }

    fn read_frame(
        &mut self,
        output: &FrameOutputOptions,
    ) -> Result<Option<DynamicImage>, FrameGrabError> {
        let (width, height) = output.resolve_dimensions(self.metadata.width, self.metadata.height);
        match self.current.take() {
            Some(Step::Frame) | None => Ok(Some(DynamicImage::ImageRgb8(RgbImage::new(
                width, height,
            )))),
            Some(Step::EndOfStream) => Ok(None),
            Some(Step::DecodeError) => Err(FrameGrabError::VideoDecodeError(
                "corrupt packet".to_string(),
            )),
            Some(Step::Unencodable) => Ok(Some(DynamicImage::ImageRgb32F(Rgb32FImage::new(
                70_000, 1,
            )))),
            Some(Step::SeekError) => unreachable!("read after failed seek"),
        }
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .expect("Failed to read output directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn ten_second_video_yields_five_frames() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(300, 30.0, &[]);
    let seeks = source.seeks.clone();

    let report = extract_from_source(source, temporary_directory.path(), &ExtractOptions::new())
        .expect("Extraction should succeed");

    let expected: Vec<Duration> = [0, 2, 4, 6, 8].into_iter().map(Duration::from_secs).collect();
    assert_eq!(*seeks.lock().unwrap(), expected);
    assert_eq!(report.timestamps(), expected);
    assert_eq!(report.duration, Duration::from_secs(10));
    assert_eq!(report.saved_count(), 5);
    assert!(report.is_complete());
    assert_eq!(report.to_string(), "Extraction complete. Total frames saved: 5");
    assert_eq!(
        file_names(temporary_directory.path()),
        vec![
            "frame_0000.jpg",
            "frame_0001.jpg",
            "frame_0002.jpg",
            "frame_0003.jpg",
            "frame_0004.jpg",
        ]
    );
}

#[test]
fn failed_timestamps_do_not_leave_gaps() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(
        120,
        24.0,
        &[
            Step::Frame,
            Step::EndOfStream,
            Step::Frame,
            Step::SeekError,
            Step::DecodeError,
            Step::Frame,
        ],
    );

    let options = ExtractOptions::new().with_count(6);
    let report = extract_from_source(source, temporary_directory.path(), &options)
        .expect("Per-frame failures are not terminal");

    assert_eq!(report.outcomes.len(), 6);
    assert_eq!(report.saved_count(), 3);
    assert_eq!(report.failure_count(), 3);
    assert!(!report.is_complete());

    let kinds: Vec<FailureKind> = report.failures().map(|failure| failure.kind).collect();
    assert_eq!(
        kinds,
        vec![FailureKind::Decode, FailureKind::Seek, FailureKind::Decode]
    );

    let indices: Vec<u32> = report.saved().map(|saved| saved.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(
        file_names(temporary_directory.path()),
        vec!["frame_0000.jpg", "frame_0001.jpg", "frame_0002.jpg"]
    );
    assert_eq!(report.to_string(), "Extraction complete. Total frames saved: 3");
}

#[test]
fn write_failure_does_not_consume_an_index() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(30, 10.0, &[Step::Frame, Step::Unencodable, Step::Frame]);

    let options = ExtractOptions::new().with_count(3);
    let report = extract_from_source(source, temporary_directory.path(), &options)
        .expect("Write failures are not terminal");

    match &report.outcomes[1] {
        FrameOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Write),
        other => panic!("Expected a write failure, got {other:?}"),
    }
    match &report.outcomes[2] {
        FrameOutcome::Saved(saved) => {
            assert_eq!(saved.index, 1);
            assert_eq!(saved.timestamp, Duration::from_secs(2));
            assert!(saved.path.ends_with("frame_0001.jpg"));
        }
        other => panic!("Expected a saved frame, got {other:?}"),
    }
    assert_eq!(
        file_names(temporary_directory.path()),
        vec!["frame_0000.jpg", "frame_0001.jpg"]
    );
}

#[test]
fn failed_final_write_leaves_no_partial_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(30, 10.0, &[Step::Frame, Step::Frame, Step::Unencodable]);

    let options = ExtractOptions::new().with_count(3);
    let report = extract_from_source(source, temporary_directory.path(), &options)
        .expect("Write failures are not terminal");

    assert_eq!(report.saved_count(), 2);
    match &report.outcomes[2] {
        FrameOutcome::Failed(failure) => assert_eq!(failure.kind, FailureKind::Write),
        other => panic!("Expected a write failure, got {other:?}"),
    }
    assert_eq!(
        file_names(temporary_directory.path()),
        vec!["frame_0000.jpg", "frame_0001.jpg"]
    );
}

#[test]
fn blocked_output_path_is_reported_per_frame() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    // A directory squatting on the first file name makes every write fail.
    fs::create_dir(temporary_directory.path().join("frame_0000.jpg")).unwrap();

    let source = ScriptedSource::new(50, 25.0, &[]);
    let options = ExtractOptions::new().with_count(2);
    let report = extract_from_source(source, temporary_directory.path(), &options)
        .expect("Write failures are not terminal");

    assert_eq!(report.saved_count(), 0);
    assert!(report.failures().all(|failure| failure.kind == FailureKind::Write));
    assert_eq!(report.failure_count(), 2);
}

#[test]
fn zero_frame_rate_is_a_clean_terminal_failure() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(100, 0.0, &[]);
    let released = source.released.clone();
    let seeks = source.seeks.clone();

    let result = extract_from_source(source, temporary_directory.path(), &ExtractOptions::new());

    match result {
        Err(FrameGrabError::InvalidSource { path, reason }) => {
            assert_eq!(path, PathBuf::from("scripted.mp4"));
            assert!(reason.contains("frame rate"), "{reason}");
        }
        other => panic!("Expected InvalidSource, got {other:?}"),
    }
    assert!(released.load(Ordering::SeqCst), "Source must be released");
    assert!(seeks.lock().unwrap().is_empty());
    assert!(file_names(temporary_directory.path()).is_empty());
}

#[test]
fn zero_frame_count_is_invalid_source() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(0, 30.0, &[]);

    let result = extract_from_source(source, temporary_directory.path(), &ExtractOptions::new());
    assert!(matches!(result, Err(FrameGrabError::InvalidSource { .. })));
}

#[test]
fn zero_count_is_rejected_before_touching_destination() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let destination = temporary_directory.path().join("never_created");
    let source = ScriptedSource::new(100, 25.0, &[]);
    let released = source.released.clone();

    let result = extract_from_source(source, &destination, &ExtractOptions::new().with_count(0));

    assert!(matches!(result, Err(FrameGrabError::InvalidCount)));
    assert!(!destination.exists());
    assert!(released.load(Ordering::SeqCst));
}

#[test]
fn oversized_count_is_rejected_before_touching_destination() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let destination = temporary_directory.path().join("never_created");
    let source = ScriptedSource::new(100, 25.0, &[]);

    let result = extract_from_source(
        source,
        &destination,
        &ExtractOptions::new().with_count(u32::MAX),
    );

    match result {
        Err(FrameGrabError::TooManyImages { requested, limit }) => {
            assert_eq!(requested, u32::MAX);
            assert_eq!(limit, MAX_IMAGE_COUNT);
        }
        other => panic!("Expected TooManyImages, got {other:?}"),
    }
    assert!(!destination.exists());
}

#[test]
fn count_at_the_limit_is_accepted() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(20_000, 25.0, &[]);

    let report = extract_from_source(
        source,
        temporary_directory.path(),
        &ExtractOptions::new()
            .with_count(MAX_IMAGE_COUNT)
            .with_resolution(Some(1), Some(1))
            .with_image_format(ImageFormat::Bmp),
    )
    .expect("Extraction at the limit should succeed");

    assert_eq!(report.saved_count(), MAX_IMAGE_COUNT as usize);
    let last = report.saved().last().expect("Expected saved frames");
    assert!(last.path.ends_with("frame_9999.bmp"));
}

#[test]
fn source_is_released_after_success() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = ScriptedSource::new(100, 25.0, &[Step::EndOfStream]);
    let released = source.released.clone();

    extract_from_source(source, temporary_directory.path(), &ExtractOptions::new())
        .expect("Extraction should succeed");
    assert!(released.load(Ordering::SeqCst));
}

#[test]
fn nested_destination_is_created() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let destination = temporary_directory.path().join("a").join("b").join("frames");
    let source = ScriptedSource::new(100, 25.0, &[]);

    let report = extract_from_source(source, &destination, &ExtractOptions::new().with_count(2))
        .expect("Extraction should succeed");

    assert_eq!(report.destination, destination);
    assert_eq!(file_names(&destination), vec!["frame_0000.jpg", "frame_0001.jpg"]);
}

#[test]
fn uncreatable_destination_is_terminal() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let blocker = temporary_directory.path().join("not_a_dir");
    fs::write(&blocker, b"file").unwrap();

    let source = ScriptedSource::new(100, 25.0, &[]);
    let result = extract_from_source(source, blocker.join("frames"), &ExtractOptions::new());

    assert!(matches!(result, Err(FrameGrabError::OutputDirectory { .. })));
}

#[test]
fn repeated_runs_produce_identical_file_sets() {
    let steps = [Step::Frame, Step::DecodeError, Step::Frame, Step::Frame];
    let options = ExtractOptions::new().with_count(4);

    let first = tempfile::tempdir().expect("Failed to create temp dir");
    let second = tempfile::tempdir().expect("Failed to create temp dir");
    extract_from_source(ScriptedSource::new(200, 20.0, &steps), first.path(), &options).unwrap();
    extract_from_source(ScriptedSource::new(200, 20.0, &steps), second.path(), &options).unwrap();

    assert_eq!(file_names(first.path()), file_names(second.path()));
    for name in file_names(first.path()) {
        assert_eq!(
            fs::read(first.path().join(&name)).unwrap(),
            fs::read(second.path().join(&name)).unwrap(),
        );
    }
}

#[test]
fn options_shape_written_files() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExtractOptions::new()
        .with_count(2)
        .with_image_format(ImageFormat::Png)
        .with_file_prefix("still")
        .with_resolution(Some(4), None);

    let report = extract_from_source(
        ScriptedSource::new(100, 25.0, &[]),
        temporary_directory.path(),
        &options,
    )
    .expect("Extraction should succeed");

    assert_eq!(
        file_names(temporary_directory.path()),
        vec!["still_0000.png", "still_0001.png"]
    );
    let first = report.saved().next().unwrap();
    let image = image::open(&first.path).expect("Written file should decode");
    // 8x6 source scaled to width 4 keeps the aspect ratio.
    assert_eq!((image.width(), image.height()), (4, 3));
}

struct Recorder {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_walks_the_schedule() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let recorder = Arc::new(Recorder {
        infos: Mutex::new(Vec::new()),
    });
    let options = ExtractOptions::new()
        .with_count(3)
        .with_progress(recorder.clone());

    extract_from_source(
        ScriptedSource::new(90, 30.0, &[Step::Frame, Step::EndOfStream, Step::Frame]),
        temporary_directory.path(),
        &options,
    )
    .expect("Extraction should succeed");

    let infos = recorder.infos.lock().unwrap();
    assert_eq!(infos.len(), 4, "One report per timestamp plus completion");
    for window in infos[..3].windows(2) {
        assert!(window[1].current > window[0].current);
    }
    assert!(infos.iter().all(|info| info.total == 3));

    let last = infos.last().unwrap();
    assert_eq!(last.current, 3);
    assert_eq!(last.saved, 2);
    assert_eq!(last.current_timestamp, None);
}
