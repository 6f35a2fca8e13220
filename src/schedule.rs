//! Sampling schedule.
//!
//! Pure timeline arithmetic: how long a source runs and which timestamps
//! evenly divide it. Nothing here touches FFmpeg.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framegrab::schedule::{sample_timestamps, source_duration};
//!
//! let duration = source_duration(250, 25.0)?;
//! assert_eq!(duration, Duration::from_secs(10));
//!
//! let timestamps = sample_timestamps(duration, 5);
//! assert_eq!(timestamps[1], Duration::from_secs(2));
//! # Ok::<(), framegrab::schedule::TimelineError>(())
//! ```

use std::time::Duration;

use thiserror::Error;

/// Why a source's timeline cannot be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimelineError {
    /// The frame rate is zero, negative, or not finite.
    #[error("frame rate {0} is not a positive finite number")]
    FrameRate(f64),
    /// The source reports no frames at all.
    #[error("source reports zero frames")]
    NoFrames,
    /// `frame_count / frame_rate` does not fit in a [`Duration`].
    #[error("duration of {frame_count} frames at {frames_per_second} fps is out of range")]
    Overflow {
        /// Frame count that was divided.
        frame_count: u64,
        /// Frame rate it was divided by.
        frames_per_second: f64,
    },
}

/// Total playing time of a source: `frame_count / frames_per_second`.
///
/// # Errors
///
/// Returns [`TimelineError`] instead of dividing by a zero or non-finite
/// rate, or producing a zero-length timeline.
pub fn source_duration(
    frame_count: u64,
    frames_per_second: f64,
) -> Result<Duration, TimelineError> {
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return Err(TimelineError::FrameRate(frames_per_second));
    }
    if frame_count == 0 {
        return Err(TimelineError::NoFrames);
    }

    Duration::try_from_secs_f64(frame_count as f64 / frames_per_second).map_err(|_| {
        TimelineError::Overflow {
            frame_count,
            frames_per_second,
        }
    })
}

/// `count` timestamps spaced `duration / count` apart, starting at zero.
///
/// The result is `0, D/N, 2D/N, ..., (N-1)D/N`: non-decreasing, and strictly
/// increasing whenever `duration` spans at least `count` nanoseconds. Every
/// timestamp is below `duration`. A zero `count` yields an empty schedule.
pub fn sample_timestamps(duration: Duration, count: u32) -> Vec<Duration> {
    if count == 0 {
        return Vec::new();
    }
    let interval = duration / count;
    (0..count).map(|index| interval * index).collect()
}
