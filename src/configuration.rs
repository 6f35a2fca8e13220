//! Extraction options.
//!
//! [`ExtractOptions`] is a builder carrying everything about a run except the
//! source and destination paths: how many frames, how they are named and
//! encoded, how they are scaled, and who gets progress updates.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::{ExtractOptions, ImageFormat, PixelFormat};
//!
//! let options = ExtractOptions::new()
//!     .with_count(12)
//!     .with_image_format(ImageFormat::Png)
//!     .with_pixel_format(PixelFormat::Gray8)
//!     .with_resolution(Some(640), None);
//!
//! let report = framegrab::extract_with_options("input.mp4", "frames", &options)?;
//! println!("{report}");
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use ffmpeg_next::format::Pixel;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Number of frames extracted when no count is given.
pub const DEFAULT_IMAGE_COUNT: u32 = 5;

/// Largest accepted image count.
///
/// File names carry a four-digit index, so `frame_0000` through `frame_9999`
/// cover every frame of a run.
pub const MAX_IMAGE_COUNT: u32 = 10_000;

/// File name prefix used when none is given.
pub const DEFAULT_FILE_PREFIX: &str = "frame";

/// Encoding used for the written image files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// JPEG, written with a `.jpg` extension. This is the default.
    #[default]
    Jpeg,
    /// PNG.
    Png,
    /// Windows bitmap.
    Bmp,
    /// TIFF.
    Tiff,
    /// Lossless WebP.
    WebP,
}

impl ImageFormat {
    /// Parse a file extension (`"jpg"`, `".PNG"`, `"tif"`, ...).
    ///
    /// Returns `None` for extensions with no matching format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Extension appended to output file names, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::WebP => "webp",
        }
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// Pixel layout of decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Pixel format and resolution of decoded frames.
///
/// With no dimensions set the source resolution is kept. Setting one
/// dimension while [`maintain_aspect_ratio`](FrameOutputOptions::maintain_aspect_ratio)
/// is on derives the other from the source aspect ratio.
#[derive(Debug, Clone)]
pub struct FrameOutputOptions {
    /// Output pixel format.
    pub pixel_format: PixelFormat,
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// Derive a missing dimension from the source aspect ratio.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb8,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Resolve the output `(width, height)` for a source of the given size.
    pub fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let h = (source_height as f64 * w as f64 / source_width as f64).round() as u32;
                (w, h.max(1))
            }
            (Some(w), None) => (w, source_height),
            (None, Some(h)) if self.maintain_aspect_ratio && source_height > 0 => {
                let w = (source_width as f64 * h as f64 / source_height as f64).round() as u32;
                (w.max(1), h)
            }
            (None, Some(h)) => (source_width, h),
            (None, None) => (source_width, source_height),
        }
    }
}

/// Options for one extraction run.
///
/// All settings have defaults; `ExtractOptions::new()` extracts
/// [`DEFAULT_IMAGE_COUNT`] RGB frames at source resolution as
/// `frame_0000.jpg`, `frame_0001.jpg`, ...
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) count: u32,
    pub(crate) image_format: ImageFormat,
    pub(crate) file_prefix: String,
    pub(crate) frame_output: FrameOutputOptions,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("count", &self.count)
            .field("image_format", &self.image_format)
            .field("file_prefix", &self.file_prefix)
            .field("frame_output", &self.frame_output)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            count: DEFAULT_IMAGE_COUNT,
            image_format: ImageFormat::default(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            frame_output: FrameOutputOptions::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set how many evenly spaced frames to extract.
    ///
    /// Zero is accepted here and rejected when the extraction starts, with
    /// [`FrameGrabError::InvalidCount`](crate::FrameGrabError::InvalidCount).
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the encoding (and extension) of written files.
    #[must_use]
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the file name prefix. Files are named `{prefix}_{index:04}.{ext}`.
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Set the pixel format of decoded frames.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.frame_output.pixel_format = format;
        self
    }

    /// Set the output resolution. `None` keeps the source value for that
    /// dimension (or derives it, see [`FrameOutputOptions`]).
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.frame_output.width = width;
        self.frame_output.height = height;
        self
    }

    /// Control whether a single given dimension preserves the aspect ratio.
    /// Defaults to `true`.
    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.frame_output.maintain_aspect_ratio = maintain;
        self
    }

    /// Replace the whole frame output configuration.
    #[must_use]
    pub fn with_frame_output(mut self, frame_output: FrameOutputOptions) -> Self {
        self.frame_output = frame_output;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Number of frames that will be requested.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Encoding of written files.
    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    /// Frame output settings.
    pub fn frame_output(&self) -> &FrameOutputOptions {
        &self.frame_output
    }

    /// Output file name for the frame saved at `index`.
    ///
    /// ```
    /// use framegrab::ExtractOptions;
    ///
    /// assert_eq!(ExtractOptions::new().file_name(7), "frame_0007.jpg");
    /// ```
    pub fn file_name(&self, index: u32) -> String {
        format!(
            "{}_{index:04}.{}",
            self.file_prefix,
            self.image_format.extension()
        )
    }
}
