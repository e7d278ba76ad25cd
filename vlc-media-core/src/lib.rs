//! VlcMedia Core Library
//!
//! Engine-independent data structures shared by the VlcMedia player:
//! four-character format codes, decoded sample objects, the recycling
//! buffer pool and the per-kind sample queues drained by the consumer.

pub mod format;
pub mod pool;
pub mod queue;
pub mod sample;
pub mod time;
pub mod track;

pub use format::{AudioSampleFormat, FourCc, TextureSampleFormat};
pub use pool::{Pooled, SamplePool};
pub use queue::{MediaSamples, SampleQueue};
pub use sample::{AudioSample, BinarySample, OverlaySample, TextureSample, TimedSample};
pub use time::TimeRange;
pub use track::{MediaKind, TrackDescriptor, TrackKind};

/// Result type for vlc-media-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vlc-media-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid four-character code: {0:?}")]
    InvalidFourCc(String),

    #[error("Sample pool exhausted ({0} buffers in flight)")]
    PoolExhausted(usize),

    #[error("Invalid {kind:?} track index: {index}")]
    InvalidTrack { kind: TrackKind, index: i32 },
}
