//! Error types for the `framegrab` crate.
//!
//! [`FrameGrabError`] is returned for every *terminal* failure: the request
//! is malformed, the destination cannot be prepared, or the source cannot be
//! opened or has no usable timeline. Failures at an individual timestamp are
//! not errors of the whole run; they are recorded in the
//! [`ExtractionReport`](crate::ExtractionReport) instead.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for `framegrab` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameGrabError {
    /// The requested image count was zero.
    #[error("Image count must be greater than zero")]
    InvalidCount,

    /// The requested image count exceeds what the file naming can number.
    #[error("Image count {requested} exceeds the limit of {limit}")]
    TooManyImages {
        /// Count that was requested.
        requested: u32,
        /// Largest accepted count.
        limit: u32,
    },

    /// The destination folder could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Folder that was passed as the destination.
        path: PathBuf,
        /// Underlying filesystem error.
        source: IoError,
    },

    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container opened but holds no video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The source opened but its timeline cannot be sampled.
    ///
    /// Raised for a zero or non-finite frame rate and for a zero frame count,
    /// either of which would make the duration meaningless.
    #[error("Invalid video source {path}: {reason}")]
    InvalidSource {
        /// Path of the offending source.
        path: PathBuf,
        /// What made the source unusable.
        reason: String,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding an output frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FrameGrabError {
    fn from(error: FfmpegError) -> Self {
        FrameGrabError::FfmpegError(error.to_string())
    }
}
