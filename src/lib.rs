//! # framegrab
//!
//! Extract a fixed number of evenly spaced still frames from a video file
//! and write them to a folder as images.
//!
//! Decoding is done by FFmpeg through the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; images are
//! encoded with [`image`](https://crates.io/crates/image).
//!
//! ## Quick Start
//!
//! ```no_run
//! // A 10-second video sampled five times gives frames at 0, 2, 4, 6 and 8
//! // seconds, written as extracted_frames/frame_0000.jpg ... frame_0004.jpg.
//! let report = framegrab::extract("input.mp4", "extracted_frames", 5)?;
//! println!("{report}"); // Extraction complete. Total frames saved: 5
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```
//!
//! ## Options
//!
//! ```no_run
//! use framegrab::{ExtractOptions, ImageFormat};
//!
//! let options = ExtractOptions::new()
//!     .with_count(24)
//!     .with_image_format(ImageFormat::Png)
//!     .with_resolution(Some(320), None);
//! let report = framegrab::extract_with_options("input.mp4", "thumbs", &options)?;
//! for failure in report.failures() {
//!     eprintln!("{failure}");
//! }
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```
//!
//! ## Failure model
//!
//! A run either fails as a whole with a [`FrameGrabError`] (zero count,
//! destination cannot be created, source cannot be opened, zero frame rate)
//! or returns an [`ExtractionReport`] with one outcome per timestamp. A
//! timestamp that cannot be decoded or written is reported and skipped; the
//! saved files stay contiguously numbered.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system.

pub mod configuration;
mod conversion;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod metadata;
pub mod progress;
pub mod report;
pub mod schedule;
pub mod source;

pub use configuration::{
    DEFAULT_FILE_PREFIX, DEFAULT_IMAGE_COUNT, ExtractOptions, FrameOutputOptions, ImageFormat,
    MAX_IMAGE_COUNT, PixelFormat,
};
pub use error::FrameGrabError;
pub use extractor::{ExtractionRequest, extract, extract_from_source, extract_with_options};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use progress::{ProgressCallback, ProgressInfo};
pub use report::{ExtractionReport, FailureKind, FrameFailure, FrameOutcome, SavedFrame};
pub use schedule::TimelineError;
pub use source::{FrameSource, VideoSource};
