//! Extraction outcomes.
//!
//! Every timestamp in the sampling schedule produces exactly one
//! [`FrameOutcome`]. The outcomes, in schedule order, make up the
//! [`ExtractionReport`] returned by a successful run.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A frame that was decoded and written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedFrame {
    /// Sequential index used in the file name. Counts successful saves only.
    pub index: u32,
    /// Timestamp the frame was requested at.
    pub timestamp: Duration,
    /// Where the image was written.
    pub path: PathBuf,
}

/// Stage at which a timestamp failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The source could not be repositioned.
    Seek,
    /// No frame could be decoded at or after the timestamp.
    Decode,
    /// The decoded frame could not be encoded or written.
    Write,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            FailureKind::Seek => "seek",
            FailureKind::Decode => "decode",
            FailureKind::Write => "write",
        };
        f.write_str(label)
    }
}

/// A timestamp for which no file was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFailure {
    /// Timestamp the frame was requested at.
    pub timestamp: Duration,
    /// Stage that failed.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub message: String,
}

impl Display for FrameFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Unable to capture frame at {:.3} seconds ({} failed: {})",
            self.timestamp.as_secs_f64(),
            self.kind,
            self.message
        )
    }
}

/// Result of processing one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The frame was written.
    Saved(SavedFrame),
    /// The timestamp was skipped.
    Failed(FrameFailure),
}

impl FrameOutcome {
    /// Timestamp this outcome belongs to.
    pub fn timestamp(&self) -> Duration {
        match self {
            FrameOutcome::Saved(saved) => saved.timestamp,
            FrameOutcome::Failed(failure) => failure.timestamp,
        }
    }

    /// Returns `true` if a file was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, FrameOutcome::Saved(_))
    }
}

/// Summary of a completed extraction.
///
/// A report exists only if the source opened and had a usable timeline;
/// individual timestamps may still have failed.
///
/// # Example
///
/// ```no_run
/// let report = framegrab::extract("input.mp4", "frames", 5)?;
/// for failure in report.failures() {
///     eprintln!("{failure}");
/// }
/// println!("{report}");
/// # Ok::<(), framegrab::FrameGrabError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// Number of frames that were requested.
    pub requested: u32,
    /// Duration the schedule was computed from.
    pub duration: Duration,
    /// Folder the frames were written to.
    pub destination: PathBuf,
    /// One outcome per scheduled timestamp, in schedule order.
    pub outcomes: Vec<FrameOutcome>,
}

impl ExtractionReport {
    pub(crate) fn new(requested: u32, duration: Duration, destination: &Path) -> Self {
        Self {
            requested,
            duration,
            destination: destination.to_path_buf(),
            outcomes: Vec::with_capacity(requested as usize),
        }
    }

    /// Frames that were written, in save order.
    pub fn saved(&self) -> impl Iterator<Item = &SavedFrame> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FrameOutcome::Saved(saved) => Some(saved),
            FrameOutcome::Failed(_) => None,
        })
    }

    /// Timestamps that produced no file.
    pub fn failures(&self) -> impl Iterator<Item = &FrameFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FrameOutcome::Failed(failure) => Some(failure),
            FrameOutcome::Saved(_) => None,
        })
    }

    /// Number of files written.
    pub fn saved_count(&self) -> usize {
        self.saved().count()
    }

    /// Number of timestamps that failed.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Returns `true` if every requested frame was written.
    pub fn is_complete(&self) -> bool {
        self.saved_count() == self.requested as usize
    }

    /// The timestamps that were attempted, in order.
    pub fn timestamps(&self) -> Vec<Duration> {
        self.outcomes.iter().map(FrameOutcome::timestamp).collect()
    }
}

impl Display for ExtractionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Extraction complete. Total frames saved: {}",
            self.saved_count()
        )
    }
}
