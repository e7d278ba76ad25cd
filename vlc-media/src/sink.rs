//! Push-style sample consumers
//!
//! One small trait per media kind. Sinks are owned by the host; the output
//! manager only keeps weak references, so a sink may disappear at any time.

use std::sync::Arc;
use std::time::Duration;
use vlc_media_core::{AudioSampleFormat, OverlaySample, TextureSample};

/// A block of audio borrowed from the decoder for the duration of a call
#[derive(Debug, Clone, Copy)]
pub struct AudioFrames<'a> {
    pub data: &'a [u8],
    pub frames: u32,
    pub channels: u32,
    pub format: AudioSampleFormat,
    pub sample_rate: u32,
    pub time: Duration,
    pub duration: Duration,
}

/// Receives audio synchronously on the decode thread
pub trait AudioSink: Send + Sync {
    /// Consumes a block of samples. `frames.data` is only valid during the call.
    fn play_samples(&self, frames: &AudioFrames<'_>);

    /// Drops buffered samples; `shutdown` is set when the sink is being detached
    fn flush(&self, shutdown: bool);

    /// Playback rate changed
    fn set_rate(&self, _rate: f32) {}

    fn pause(&self) {}

    fn resume(&self) {}

    /// Plays out buffered samples
    fn drain(&self) {}
}

/// Receives decoded video frames
pub trait TextureSink: Send + Sync {
    fn on_texture_sample(&self, sample: Arc<TextureSample>);

    fn flush(&self, shutdown: bool);
}

/// Receives caption and subtitle text.
///
/// Captions are not delivered yet: the native text renderer is disabled and
/// no overlay callbacks are registered, so a sink only sees flushes.
pub trait OverlaySink: Send + Sync {
    fn on_overlay_sample(&self, sample: Arc<OverlaySample>);

    fn flush(&self, shutdown: bool);
}
