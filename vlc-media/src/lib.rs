//! VlcMedia: LibVLC media player adapter
//!
//! Bridges LibVLC's synchronous C callbacks (format negotiation, buffer
//! lock/unlock/display, audio sample delivery) to pull-style sample queues
//! and push-style sinks, and drives a player state machine from the native
//! event stream.
//!
//! The native engine is reached through the [`native`] traits. Enable the
//! `libvlc` feature to link the real library and get
//! [`libvlc::LibVlcEngine`].

pub mod callbacks;
pub mod events;
pub mod instance;
pub mod native;
pub mod negotiate;
pub mod output;
pub mod player;
pub mod settings;
pub mod sink;
pub mod source;
pub mod tracks;
pub mod vlc_bindings;

#[cfg(feature = "libvlc")]
pub mod libvlc;

#[cfg(test)]
pub(crate) mod mock;

pub use events::MediaEvent;
pub use instance::EngineInstance;
pub use native::{NativeEngine, NativeMedia, NativePlayer, NativeState};
pub use player::{MediaState, VlcMediaPlayer};
pub use settings::{MediaOptions, OutputSettings, VideoFallbackPolicy, VlcLogLevel, VlcMediaSettings};
pub use sink::{AudioFrames, AudioSink, OverlaySink, TextureSink};

/// Result type for vlc-media operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vlc-media operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] vlc_media_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Native engine error: {0}")]
    Native(String),

    #[error("Invalid media URL: {0:?}")]
    InvalidUrl(String),

    #[error("No media is open")]
    NotOpen,

    #[error("Operation not allowed in state {0:?}")]
    InvalidState(NativeState),
}
