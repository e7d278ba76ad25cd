//! Audio and video format negotiation
//!
//! The decoder proposes a format in the setup callbacks and accepts whatever
//! we write back. These functions pick the delivered format, rewrite the
//! proposal in place and return the negotiated geometry.

use crate::settings::VideoFallbackPolicy;
use std::time::Duration;
use vlc_media_core::{AudioSampleFormat, FourCc, TextureSampleFormat};

/// Largest channel count delivered to consumers
pub const MAX_AUDIO_CHANNELS: u32 = 8;

/// Negotiated PCM layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub format: AudioSampleFormat,
    pub channels: u32,
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Bytes per sample of one channel
    pub fn sample_size(&self) -> usize {
        self.format.bytes_per_sample()
    }

    /// Bytes occupied by `frames` interleaved frames
    pub fn buffer_size(&self, frames: u32) -> usize {
        frames as usize * self.sample_size() * self.channels as usize
    }
}

/// Negotiates the audio output format.
///
/// Unsigned 8-bit is delivered as signed 8-bit; any other unsupported tag is
/// rewritten to signed 16-bit native endian. The channel count is clamped to
/// [`MAX_AUDIO_CHANNELS`].
pub fn negotiate_audio(tag: &mut FourCc, sample_rate: u32, channels: &mut u32) -> AudioFormat {
    *channels = (*channels).min(MAX_AUDIO_CHANNELS);

    let format = match *tag {
        FourCc::S8 => AudioSampleFormat::Int8,
        FourCc::S16N => AudioSampleFormat::Int16,
        FourCc::S32N => AudioSampleFormat::Int32,
        FourCc::FL32 => AudioSampleFormat::Float,
        FourCc::FL64 => AudioSampleFormat::Double,
        FourCc::U8 => {
            *tag = FourCc::S8;
            AudioSampleFormat::Int8
        }
        other => {
            tracing::debug!(format = %other, "unsupported audio format, using S16N");
            *tag = FourCc::S16N;
            AudioSampleFormat::Int16
        }
    };

    AudioFormat {
        format,
        channels: *channels,
        sample_rate,
    }
}

/// Negotiated video frame layout.
///
/// Dimensions are in pixels; `stride` is the number of bytes per row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFormat {
    pub chroma: FourCc,
    pub format: TextureSampleFormat,
    pub buffer_dim: (u32, u32),
    pub output_dim: (u32, u32),
    pub stride: u32,
    pub frame_duration: Duration,
}

impl VideoFormat {
    /// Bytes needed for one frame
    pub fn buffer_size(&self) -> usize {
        self.stride as usize * self.buffer_dim.1 as usize
    }
}

fn align16(value: u32) -> Option<u32> {
    Some(value.checked_add(15)? & !15)
}

/// Negotiates the video output format.
///
/// Packed chromas we can deliver are kept at the decoder's dimensions. Other
/// chromas fall back per `policy` to a packed format at the output size;
/// 2-byte formats get both dimensions aligned to 16. Returns `None` (reject)
/// for degenerate or oversized frames and chromas the engine doesn't know.
pub fn negotiate_video(
    chroma: &mut FourCc,
    width: &mut u32,
    height: &mut u32,
    output_dim: Option<(u32, u32)>,
    fps: f32,
    policy: &VideoFallbackPolicy,
    plane_count: impl FnOnce(FourCc) -> Option<u32>,
) -> Option<VideoFormat> {
    let output_dim = output_dim.filter(|&(w, h)| w > 0 && h > 0)?;

    let (format, buffer_dim) = match VideoFallbackPolicy::texture_format(*chroma) {
        Some(format) => (format, (*width, *height)),
        None => {
            let planes = plane_count(*chroma).unwrap_or(0);
            if planes == 0 {
                tracing::debug!(chroma = %chroma, "unknown chroma");
                return None;
            }

            let fallback = if planes > 1 {
                policy.multi_plane
            } else {
                policy.single_plane
            };
            let Some(format) = VideoFallbackPolicy::texture_format(fallback) else {
                tracing::warn!(chroma = %fallback, "fallback chroma is not a packed format");
                return None;
            };

            let dim = if format.bytes_per_pixel() == 2 {
                (align16(output_dim.0)?, align16(output_dim.1)?)
            } else {
                output_dim
            };

            tracing::debug!(from = %chroma, to = %fallback, planes, "video chroma fallback");
            *chroma = fallback;
            *width = dim.0;
            *height = dim.1;
            (format, dim)
        }
    };

    if buffer_dim.0 == 0 || buffer_dim.1 == 0 {
        return None;
    }

    let stride = buffer_dim
        .0
        .checked_mul(format.bytes_per_pixel())
        .filter(|&stride| (stride as usize).checked_mul(buffer_dim.1 as usize).is_some());
    let Some(stride) = stride else {
        tracing::warn!(width = buffer_dim.0, height = buffer_dim.1, "video frame too large");
        return None;
    };

    let frame_duration = if fps.is_finite() && fps > 0.0 {
        Duration::from_secs_f64(1.0 / fps as f64)
    } else {
        Duration::ZERO
    };

    Some(VideoFormat {
        chroma: *chroma,
        format,
        buffer_dim,
        output_dim,
        stride,
        frame_duration,
    })
}
