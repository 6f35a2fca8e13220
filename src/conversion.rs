//! Internal conversion helpers.
//!
//! Pixel-buffer packing and timestamp rescaling shared by the FFmpeg-backed
//! source.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy plane 0 of a packed video frame into a tightly packed buffer.
///
/// FFmpeg rows may be padded (stride > width × bytes per pixel); the padding
/// is dropped so the result can be handed to `image` buffer constructors.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    pack_rows(
        video_frame.data(0),
        video_frame.stride(0),
        width as usize * bytes_per_pixel,
        height as usize,
    )
}

fn pack_rows(data: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    if stride == row_bytes {
        return data[..row_bytes * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Rescale a PTS value from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a [`Duration`] to a container seek position in `AV_TIME_BASE`
/// (microseconds), as expected by `avformat_seek_file` with no stream index.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Frames per second from a stream rate, or `0.0` when the rate is unset.
pub(crate) fn rational_to_rate(rate: Rational) -> f64 {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return 0.0;
    }
    rate.numerator() as f64 / rate.denominator() as f64
}
