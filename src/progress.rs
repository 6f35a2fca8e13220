//! Progress reporting.
//!
//! [`ProgressCallback`] observes an extraction as it walks the sampling
//! schedule. It is invoked once per attempted timestamp and once more when
//! the run finishes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framegrab::{ExtractOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.0}% ({} saved)", info.saved);
//!         }
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let report = framegrab::extract_with_options("input.mp4", "frames", &options)?;
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Timestamps attempted so far, successful or not.
    pub current: u64,
    /// Timestamps in the schedule.
    pub total: u64,
    /// Frames written so far.
    pub saved: u64,
    /// Completion percentage (0.0 – 100.0). `None` for an empty schedule.
    pub percentage: Option<f32>,
    /// Wall-clock time since the first seek.
    pub elapsed: Duration,
    /// Estimated time remaining, from the average time per timestamp.
    pub estimated_remaining: Option<Duration>,
    /// The timestamp just attempted. `None` on the final report.
    pub current_timestamp: Option<Duration>,
}

/// Receives progress updates during extraction.
///
/// Callbacks are infallible: they observe the run but cannot stop it.
pub trait ProgressCallback: Send + Sync {
    /// Called after each timestamp and once at completion.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default when nothing is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one run and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    saved: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            saved: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one attempted timestamp and report it.
    pub(crate) fn advance(&mut self, timestamp: Duration, saved: bool) {
        self.current += 1;
        if saved {
            self.saved += 1;
        }
        self.report(Some(timestamp));
    }

    /// Emit the final report.
    pub(crate) fn finish(&self) {
        self.report(None);
    }

    fn report(&self, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let percentage = (self.total > 0).then(|| self.current as f32 / self.total as f32 * 100.0);

        let estimated_remaining = (self.current > 0).then(|| {
            let remaining = self.total.saturating_sub(self.current);
            elapsed.div_f64(self.current as f64).mul_f64(remaining as f64)
        });

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            saved: self.saved,
            percentage,
            elapsed,
            estimated_remaining,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}
