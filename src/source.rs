//! Video sources.
//!
//! [`FrameSource`] is what the extraction loop needs from a video: its
//! metadata, a way to seek, and a way to decode the next frame.
//! [`VideoSource`] implements it on top of FFmpeg.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::{
    configuration::{FrameOutputOptions, PixelFormat},
    conversion,
    error::FrameGrabError,
    metadata::VideoMetadata,
};

/// A seekable, decodable video timeline.
///
/// The extraction loop only talks to this trait, so anything that can hand
/// out frames by time can be sampled.
pub trait FrameSource {
    /// Cached stream metadata.
    fn metadata(&self) -> &VideoMetadata;

    /// Location the source was opened from.
    fn path(&self) -> &Path;

    /// Reposition to `timestamp`, measured from the start of the video.
    fn seek(&mut self, timestamp: Duration) -> Result<(), FrameGrabError>;

    /// Decode one frame at or after the current position.
    ///
    /// Implementations may allow a small slack for timestamp rounding;
    /// [`VideoSource`] accepts a frame up to half a frame interval before the
    /// position, so the frame sitting on the position is never skipped.
    ///
    /// Returns `Ok(None)` when the stream ends before such a frame appears.
    fn read_frame(
        &mut self,
        output: &FrameOutputOptions,
    ) -> Result<Option<DynamicImage>, FrameGrabError>;
}

/// An opened video file.
///
/// Holds the FFmpeg demuxer for the lifetime of the value; dropping it
/// releases the decoder's resources.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use framegrab::{FrameOutputOptions, FrameSource, VideoSource};
///
/// let mut source = VideoSource::open("input.mp4")?;
/// source.seek(Duration::from_secs(3))?;
/// if let Some(frame) = source.read_frame(&FrameOutputOptions::default())? {
///     frame.save("at_3s.png")?;
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct VideoSource {
    input_context: Input,
    stream_index: usize,
    time_base: Rational,
    /// Stream start offset in seconds; timestamps are relative to it.
    start_offset: f64,
    metadata: VideoMetadata,
    position: Duration,
    /// Whether the demuxer sits at `position` with no packets consumed yet.
    positioned: bool,
    file_path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("file_path", &self.file_path)
            .field("stream_index", &self.stream_index)
            .field("metadata", &self.metadata)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file and read its stream metadata.
    ///
    /// Initializes FFmpeg (idempotent), opens the container and selects the
    /// best video stream.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::FileOpen`] if the file cannot be opened or its
    ///   video codec parameters cannot be read.
    /// - [`FrameGrabError::NoVideoStream`] if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameGrabError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video source: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FrameGrabError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FrameGrabError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let duration_microseconds = input_context.duration();
        let container_duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FrameGrabError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let start_offset = match stream.start_time() {
            ffmpeg_next::ffi::AV_NOPTS_VALUE => 0.0,
            start => conversion::pts_to_seconds(start, time_base).max(0.0),
        };

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| FrameGrabError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to create video decoder for stream {stream_index}: {error}"),
            })?;

        // Average frame rate first, then the stream's nominal rate.
        let frames_per_second = match conversion::rational_to_rate(stream.avg_frame_rate()) {
            rate if rate > 0.0 => rate,
            _ => conversion::rational_to_rate(stream.rate()),
        };

        let declared_frames = stream.frames();
        let frame_count = if declared_frames > 0 {
            declared_frames as u64
        } else if frames_per_second > 0.0 {
            (container_duration.as_secs_f64() * frames_per_second).round() as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            codec,
            container_duration,
        };

        log::info!(
            "Opened video source: {} (stream={}, {}x{}, {:.3} fps, {} frames, codec={})",
            file_path.display(),
            stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            stream_index,
            time_base,
            start_offset,
            metadata,
            position: Duration::ZERO,
            positioned: false,
            file_path,
        })
    }

    /// The position the next [`read_frame`](FrameSource::read_frame) decodes
    /// from.
    pub fn position(&self) -> Duration {
        self.position
    }

    fn seek_container(&mut self, timestamp: Duration) -> Result<(), FrameGrabError> {
        let target = conversion::duration_to_seek_timestamp(
            timestamp + Duration::from_secs_f64(self.start_offset),
        );
        // Land on the keyframe at or before the target; decoding walks forward.
        self.input_context.seek(target, ..target)?;
        self.positioned = true;
        Ok(())
    }

    fn decode_at_position(
        &mut self,
        output: &FrameOutputOptions,
    ) -> Result<Option<(f64, DynamicImage)>, FrameGrabError> {
        let stream = self
            .input_context
            .stream(self.stream_index)
            .ok_or(FrameGrabError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let (target_width, target_height) =
            output.resolve_dimensions(decoder.width(), decoder.height());
        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            output.pixel_format.to_ffmpeg_pixel(),
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        let target = self.position.as_secs_f64();
        // Half a frame of slack so rounding in the PTS never skips the frame
        // that sits exactly on the target.
        let tolerance = if self.metadata.frames_per_second > 0.0 {
            0.5 / self.metadata.frames_per_second
        } else {
            0.0
        };

        let mut decoded_frame = VideoFrame::empty();
        let mut scaled_frame = VideoFrame::empty();

        let stream_index = self.stream_index;
        let time_base = self.time_base;
        let start_offset = self.start_offset;
        let frame_seconds = |frame: &VideoFrame| {
            let pts = frame.timestamp().or_else(|| frame.pts()).unwrap_or_else(|| {
                log::debug!("Decoded frame carries no timestamp; treating it as PTS 0");
                0
            });
            conversion::pts_to_seconds(pts, time_base) - start_offset
        };

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let seconds = frame_seconds(&decoded_frame);
                if seconds + tolerance >= target {
                    scaler.run(&decoded_frame, &mut scaled_frame)?;
                    let image = convert_frame_to_image(
                        &scaled_frame,
                        target_width,
                        target_height,
                        output.pixel_format,
                    )?;
                    return Ok(Some((seconds, image)));
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let seconds = frame_seconds(&decoded_frame);
            if seconds + tolerance >= target {
                scaler.run(&decoded_frame, &mut scaled_frame)?;
                let image = convert_frame_to_image(
                    &scaled_frame,
                    target_width,
                    target_height,
                    output.pixel_format,
                )?;
                return Ok(Some((seconds, image)));
            }
        }

        Ok(None)
    }
}

impl FrameSource for VideoSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn path(&self) -> &Path {
        &self.file_path
    }

    fn seek(&mut self, timestamp: Duration) -> Result<(), FrameGrabError> {
        log::debug!("Seeking to {:.3}s", timestamp.as_secs_f64());
        self.position = timestamp;
        self.seek_container(timestamp)
    }

    fn read_frame(
        &mut self,
        output: &FrameOutputOptions,
    ) -> Result<Option<DynamicImage>, FrameGrabError> {
        if !self.positioned {
            self.seek_container(self.position)?;
        }
        // Decoding consumes packets, so a later read has to seek again.
        self.positioned = false;

        let decoded = self.decode_at_position(output)?;
        let Some((seconds, image)) = decoded else {
            return Ok(None);
        };

        log::debug!(
            "Decoded frame at {seconds:.3}s for target {:.3}s",
            self.position.as_secs_f64()
        );

        if self.metadata.frames_per_second > 0.0 {
            let next = seconds.max(0.0) + 1.0 / self.metadata.frames_per_second;
            self.position = Duration::try_from_secs_f64(next).unwrap_or(self.position);
        }

        Ok(Some(image))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        log::debug!("Released video source: {}", self.file_path.display());
    }
}

fn convert_frame_to_image(
    frame: &VideoFrame,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
) -> Result<DynamicImage, FrameGrabError> {
    let buffer = conversion::frame_to_buffer(frame, width, height, pixel_format.bytes_per_pixel());
    let image = match pixel_format {
        PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
        PixelFormat::Gray8 => {
            GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
        }
    };
    image.ok_or_else(|| {
        FrameGrabError::VideoDecodeError(
            "Failed to construct image from decoded frame data".to_string(),
        )
    })
}
