//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened and cached for the lifetime of the handle.

use std::time::Duration;

/// Metadata for the video stream frames are sampled from.
///
/// # Example
///
/// ```no_run
/// use framegrab::{FrameSource, VideoSource};
///
/// let source = VideoSource::open("input.mp4")?;
/// let metadata = source.metadata();
/// println!(
///     "{}x{} @ {:.2} fps, {} frames",
///     metadata.width, metadata.height, metadata.frames_per_second, metadata.frame_count,
/// );
/// # Ok::<(), framegrab::FrameGrabError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second. Zero when the container declares no usable rate.
    pub frames_per_second: f64,
    /// Total number of frames, as declared by the stream or estimated from
    /// the container duration.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container-level duration. [`Duration::ZERO`] when unknown.
    pub container_duration: Duration,
}
