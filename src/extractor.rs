//! Evenly spaced frame extraction.
//!
//! [`extract`] is the crate's entry point: it samples `count` frames at equal
//! time intervals and writes them into a folder as `frame_0000.jpg`,
//! `frame_0001.jpg`, ...
//!
//! The run fails as a whole only when it cannot start (zero count,
//! destination cannot be created, source cannot be opened, source has no
//! usable timeline). Once frames are being sampled, a timestamp that cannot
//! be sought, decoded, or written is recorded in the
//! [`ExtractionReport`] and the run moves on to the next one.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    configuration::{DEFAULT_IMAGE_COUNT, ExtractOptions, MAX_IMAGE_COUNT},
    error::FrameGrabError,
    progress::ProgressTracker,
    report::{ExtractionReport, FailureKind, FrameFailure, FrameOutcome, SavedFrame},
    schedule,
    source::{FrameSource, VideoSource},
};

/// The inputs of one extraction run.
///
/// # Example
///
/// ```no_run
/// use framegrab::ExtractionRequest;
///
/// let report = ExtractionRequest::new("input.mp4", "frames")
///     .with_count(8)
///     .run()?;
/// assert!(report.saved_count() <= 8);
/// # Ok::<(), framegrab::FrameGrabError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ExtractionRequest {
    /// Video file to sample.
    pub source_path: PathBuf,
    /// Folder receiving the images. Created with parents if absent.
    pub destination: PathBuf,
    /// Number of evenly spaced frames to extract.
    pub count: u32,
}

impl ExtractionRequest {
    /// A request for [`DEFAULT_IMAGE_COUNT`] frames.
    pub fn new<S: AsRef<Path>, D: AsRef<Path>>(source_path: S, destination: D) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            count: DEFAULT_IMAGE_COUNT,
        }
    }

    /// Set the number of frames.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Run the request with default options.
    ///
    /// # Errors
    ///
    /// See [`extract_with_options`].
    pub fn run(&self) -> Result<ExtractionReport, FrameGrabError> {
        self.run_with_options(&ExtractOptions::new())
    }

    /// Run the request; the request's count overrides the one in `options`.
    ///
    /// # Errors
    ///
    /// See [`extract_with_options`].
    pub fn run_with_options(
        &self,
        options: &ExtractOptions,
    ) -> Result<ExtractionReport, FrameGrabError> {
        let options = options.clone().with_count(self.count);
        extract_with_options(&self.source_path, &self.destination, &options)
    }
}

/// Extract `count` evenly spaced frames from `source` into `destination`.
///
/// Timestamps are `0, D/N, 2D/N, ..., (N-1)D/N` where `D` is the video's
/// duration (frame count over frame rate). Frames are written as JPEG files
/// named `frame_0000.jpg`, `frame_0001.jpg`, ... in save order; the index
/// advances only when a file is written.
///
/// # Errors
///
/// - [`FrameGrabError::InvalidCount`] if `count` is zero.
/// - [`FrameGrabError::TooManyImages`] if `count` exceeds
///   [`MAX_IMAGE_COUNT`].
/// - [`FrameGrabError::OutputDirectory`] if `destination` cannot be created.
/// - [`FrameGrabError::FileOpen`] / [`FrameGrabError::NoVideoStream`] if the
///   source cannot be opened as a video. The destination has already been
///   created at this point.
/// - [`FrameGrabError::InvalidSource`] if the frame rate is zero (or not
///   finite) or the frame count is zero.
///
/// Per-timestamp failures are not errors; see
/// [`ExtractionReport::failures`].
///
/// # Example
///
/// ```no_run
/// let report = framegrab::extract("input.mp4", "extracted_frames", 5)?;
/// println!("{report}");
/// # Ok::<(), framegrab::FrameGrabError>(())
/// ```
pub fn extract<S: AsRef<Path>, D: AsRef<Path>>(
    source: S,
    destination: D,
    count: u32,
) -> Result<ExtractionReport, FrameGrabError> {
    extract_with_options(source, destination, &ExtractOptions::new().with_count(count))
}

/// Like [`extract`], with naming, encoding, scaling, and progress settings
/// taken from `options`.
///
/// # Errors
///
/// Same as [`extract`].
pub fn extract_with_options<S: AsRef<Path>, D: AsRef<Path>>(
    source: S,
    destination: D,
    options: &ExtractOptions,
) -> Result<ExtractionReport, FrameGrabError> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    validate_count(options.count)?;
    prepare_destination(destination)?;

    let video = VideoSource::open(source).inspect_err(|error| {
        log::error!("Unable to open video file {}: {error}", source.display());
    })?;

    run_extraction(video, destination, options)
}

/// Run the extraction loop over an already opened source.
///
/// Takes ownership of `source`; it is dropped (and so released) before this
/// function returns, whatever the outcome.
///
/// # Errors
///
/// [`FrameGrabError::InvalidCount`], [`FrameGrabError::TooManyImages`],
/// [`FrameGrabError::OutputDirectory`], or
/// [`FrameGrabError::InvalidSource`], as for [`extract`].
pub fn extract_from_source<F: FrameSource, D: AsRef<Path>>(
    source: F,
    destination: D,
    options: &ExtractOptions,
) -> Result<ExtractionReport, FrameGrabError> {
    let destination = destination.as_ref();
    validate_count(options.count)?;
    prepare_destination(destination)?;
    run_extraction(source, destination, options)
}

fn validate_count(count: u32) -> Result<(), FrameGrabError> {
    if count == 0 {
        log::error!("Refusing to extract zero frames");
        return Err(FrameGrabError::InvalidCount);
    }
    if count > MAX_IMAGE_COUNT {
        log::error!("Refusing to extract {count} frames (limit {MAX_IMAGE_COUNT})");
        return Err(FrameGrabError::TooManyImages {
            requested: count,
            limit: MAX_IMAGE_COUNT,
        });
    }
    Ok(())
}

fn prepare_destination(destination: &Path) -> Result<(), FrameGrabError> {
    fs::create_dir_all(destination).map_err(|source| {
        log::error!(
            "Unable to create output directory {}: {source}",
            destination.display()
        );
        FrameGrabError::OutputDirectory {
            path: destination.to_path_buf(),
            source,
        }
    })
}

fn run_extraction<F: FrameSource>(
    mut source: F,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, FrameGrabError> {
    let metadata = source.metadata();
    let duration = schedule::source_duration(metadata.frame_count, metadata.frames_per_second)
        .map_err(|error| {
            log::error!("Invalid video source {}: {error}", source.path().display());
            FrameGrabError::InvalidSource {
                path: source.path().to_path_buf(),
                reason: error.to_string(),
            }
        })?;

    let timestamps = schedule::sample_timestamps(duration, options.count);
    log::debug!(
        "Sampling {} frames over {:.3}s (every {:.3}s)",
        timestamps.len(),
        duration.as_secs_f64(),
        (duration / options.count).as_secs_f64(),
    );

    let mut report = ExtractionReport::new(options.count, duration, destination);
    let mut tracker = ProgressTracker::new(options.progress.clone(), timestamps.len() as u64);
    let mut next_index: u32 = 0;

    for timestamp in timestamps {
        let outcome = match capture(&mut source, timestamp, destination, next_index, options) {
            Ok(saved) => {
                log::info!("Saved: {}", saved.path.display());
                next_index += 1;
                FrameOutcome::Saved(saved)
            }
            Err(failure) => {
                log::warn!("{failure}");
                FrameOutcome::Failed(failure)
            }
        };
        tracker.advance(timestamp, outcome.is_saved());
        report.outcomes.push(outcome);
    }

    drop(source);
    tracker.finish();
    log::info!("{report}");

    Ok(report)
}

/// Seek, decode, and write the frame for one timestamp.
fn capture<F: FrameSource>(
    source: &mut F,
    timestamp: Duration,
    destination: &Path,
    index: u32,
    options: &ExtractOptions,
) -> Result<SavedFrame, FrameFailure> {
    let failure = |kind, message: String| FrameFailure {
        timestamp,
        kind,
        message,
    };

    source
        .seek(timestamp)
        .map_err(|error| failure(FailureKind::Seek, error.to_string()))?;

    let image = match source.read_frame(options.frame_output()) {
        Ok(Some(image)) => image,
        Ok(None) => {
            return Err(failure(
                FailureKind::Decode,
                "no frame at or after this position".to_string(),
            ));
        }
        Err(error) => return Err(failure(FailureKind::Decode, error.to_string())),
    };

    let path = destination.join(options.file_name(index));
    image
        .save_with_format(&path, options.image_format().to_image_format())
        .map_err(|error| {
            discard_partial_write(&path);
            failure(FailureKind::Write, FrameGrabError::from(error).to_string())
        })?;

    Ok(SavedFrame {
        index,
        timestamp,
        path,
    })
}

/// The encoder creates the file before writing into it, so a failed save can
/// leave an empty or truncated image under a name no saved frame owns.
fn discard_partial_write(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed partial image {}", path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!(
            "Unable to remove partial image {}: {error}",
            path.display()
        ),
    }
}
