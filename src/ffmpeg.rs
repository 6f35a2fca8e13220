//! FFmpeg console verbosity.
//!
//! FFmpeg writes its own diagnostics straight to stderr, independent of the
//! `log` records this crate emits. [`set_ffmpeg_log_level`] tunes that
//! output, e.g. to silence container warnings while sampling frames.
//!
//! ```no_run
//! use framegrab::FfmpegLogLevel;
//!
//! framegrab::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let report = framegrab::extract("input.mp4", "frames", 5)?;
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg log verbosity, from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output.
    Quiet,
    /// Only conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings. FFmpeg's default.
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging output.
    Debug,
    /// Everything.
    Trace,
}

static LEVELS: [(FfmpegLogLevel, Level, &str); 9] = [
    (FfmpegLogLevel::Quiet, Level::Quiet, "quiet"),
    (FfmpegLogLevel::Panic, Level::Panic, "panic"),
    (FfmpegLogLevel::Fatal, Level::Fatal, "fatal"),
    (FfmpegLogLevel::Error, Level::Error, "error"),
    (FfmpegLogLevel::Warning, Level::Warning, "warning"),
    (FfmpegLogLevel::Info, Level::Info, "info"),
    (FfmpegLogLevel::Verbose, Level::Verbose, "verbose"),
    (FfmpegLogLevel::Debug, Level::Debug, "debug"),
    (FfmpegLogLevel::Trace, Level::Trace, "trace"),
];

impl FfmpegLogLevel {
    fn entry(self) -> &'static (FfmpegLogLevel, Level, &'static str) {
        // Every variant has exactly one row.
        &LEVELS[self as usize]
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        self.entry().2
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        let lowered = if lowered == "warn" { "warning" } else { lowered.as_str() };
        LEVELS
            .iter()
            .find(|(_, _, name)| *name == lowered)
            .map(|(level, _, _)| *level)
            .ok_or_else(|| format!("unknown FFmpeg log level: {value}"))
    }
}

/// Set FFmpeg's own stderr verbosity.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.entry().1);
}

/// Current FFmpeg stderr verbosity, if it maps to a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    let current = ffmpeg_next::util::log::get_level().ok()?;
    LEVELS
        .iter()
        .find(|(_, level, _)| *level == current)
        .map(|(level, _, _)| *level)
}
