//! Decoded sample objects handed to the consumer

use crate::format::{AudioSampleFormat, TextureSampleFormat};
use crate::pool::Pooled;
use std::time::Duration;

/// Samples that occupy a span of media time
pub trait TimedSample: Send + Sync {
    /// Presentation time of the sample
    fn time(&self) -> Duration;

    /// How long the sample lasts (zero for instants)
    fn duration(&self) -> Duration;
}

/// A block of interleaved PCM audio
#[derive(Debug)]
pub struct AudioSample {
    buffer: Pooled<Vec<u8>>,
    /// Number of audio frames (samples per channel)
    pub frames: u32,
    /// Number of interleaved channels
    pub channels: u32,
    /// PCM encoding of the buffer
    pub format: AudioSampleFormat,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Presentation time
    pub time: Duration,
    /// Playback duration
    pub duration: Duration,
}

impl AudioSample {
    /// Builds a sample by copying `data` into `buffer`.
    ///
    /// The buffer is resized to `data.len()`, so recycled buffers of any
    /// previous size can be used.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mut buffer: Pooled<Vec<u8>>,
        data: &[u8],
        frames: u32,
        channels: u32,
        format: AudioSampleFormat,
        sample_rate: u32,
        time: Duration,
        duration: Duration,
    ) -> Self {
        buffer.clear();
        buffer.extend_from_slice(data);

        Self {
            buffer,
            frames,
            channels,
            format,
            sample_rate,
            time,
            duration,
        }
    }

    /// Raw interleaved sample bytes
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }
}

impl TimedSample for AudioSample {
    fn time(&self) -> Duration {
        self.time
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// A single decoded video frame in a packed pixel layout
#[derive(Debug)]
pub struct TextureSample {
    buffer: Pooled<Vec<u8>>,
    /// Dimensions of the buffer (may exceed the output dimensions)
    pub buffer_dim: (u32, u32),
    /// Dimensions of the visible picture
    pub output_dim: (u32, u32),
    /// Pixel layout of the buffer
    pub format: TextureSampleFormat,
    /// Number of bytes per buffer row
    pub stride: u32,
    /// Presentation time
    pub time: Duration,
    /// Time code relative to the start of the current rate segment
    pub timecode: Duration,
    /// Frame duration (zero if unknown)
    pub duration: Duration,
}

impl TextureSample {
    /// Wraps a filled frame buffer
    pub fn new(
        buffer: Pooled<Vec<u8>>,
        buffer_dim: (u32, u32),
        output_dim: (u32, u32),
        format: TextureSampleFormat,
        stride: u32,
        duration: Duration,
    ) -> Self {
        Self {
            buffer,
            buffer_dim,
            output_dim,
            format,
            stride,
            time: Duration::ZERO,
            timecode: Duration::ZERO,
            duration,
        }
    }

    /// Stamps the sample with its presentation time and time code
    pub fn set_time(&mut self, time: Duration, timecode: Duration) {
        self.time = time;
        self.timecode = timecode;
    }

    /// Raw pixel bytes, `stride * buffer_dim.1` long
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }
}

impl TimedSample for TextureSample {
    fn time(&self) -> Duration {
        self.time
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Caption or subtitle text to be drawn over the video
#[derive(Debug, Clone)]
pub struct OverlaySample {
    pub text: String,
    pub position: Option<(i32, i32)>,
    pub time: Duration,
    pub duration: Duration,
}

impl TimedSample for OverlaySample {
    fn time(&self) -> Duration {
        self.time
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Opaque metadata payload
#[derive(Debug, Clone)]
pub struct BinarySample {
    pub data: Vec<u8>,
    pub time: Duration,
    pub duration: Duration,
}

impl TimedSample for BinarySample {
    fn time(&self) -> Duration {
        self.time
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SamplePool;

    #[test]
    fn test_audio_sample_copies_data() {
        let pool: SamplePool<Vec<u8>> = SamplePool::new(2);
        let mut recycled = pool.acquire().unwrap();
        recycled.resize(64, 0xff);
        drop(recycled);

        let sample = AudioSample::new(
            pool.acquire().unwrap(),
            &[1, 2, 3, 4],
            1,
            2,
            AudioSampleFormat::Int16,
            48_000,
            Duration::from_millis(5),
            Duration::from_micros(20),
        );

        assert_eq!(sample.data(), &[1, 2, 3, 4]);
        assert_eq!(sample.time(), Duration::from_millis(5));
        drop(sample);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_texture_sample_time_stamp() {
        let mut sample = TextureSample::new(
            Pooled::detached(vec![0; 16]),
            (2, 2),
            (2, 2),
            TextureSampleFormat::CharBgra,
            8,
            Duration::ZERO,
        );
        sample.set_time(Duration::from_secs(1), Duration::from_millis(500));

        assert_eq!(sample.time(), Duration::from_secs(1));
        assert_eq!(sample.timecode, Duration::from_millis(500));
        assert_eq!(sample.data().len(), 16);
    }
}
