//! Track descriptors for the elementary streams of an opened media

use std::fmt;

/// Kinds of elementary streams the native engine enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackKind {
    Audio,
    Video,
    Caption,
}

impl TrackKind {
    /// All track kinds, in the order they are reported
    pub const ALL: [TrackKind; 3] = [TrackKind::Audio, TrackKind::Caption, TrackKind::Video];

    /// Human readable label used in info strings and display names
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Caption => "Caption",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Media kinds that samples are delivered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    Caption,
    Metadata,
}

/// Describes one elementary stream.
///
/// Created once per "tracks changed" notification and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    /// Native stream identifier
    pub id: i32,
    /// Stream kind
    pub kind: TrackKind,
    /// Name reported by the native engine (may be empty)
    pub name: String,
    /// Name suitable for display
    pub display_name: String,
    /// Number of audio channels, if known
    pub channel_count: Option<u32>,
    /// Audio sample rate in Hz, if known
    pub sample_rate: Option<u32>,
    /// Video dimensions in pixels, if known
    pub dimensions: Option<(u32, u32)>,
    /// Video frame rate, if known
    pub frame_rate: Option<f32>,
}

impl TrackDescriptor {
    /// Creates a descriptor, deriving the display name from the native name.
    ///
    /// An empty name falls back to `"<Kind> Track <id>"`.
    pub fn new(id: i32, kind: TrackKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let display_name = if name.is_empty() {
            format!("{} Track {}", kind.label(), id)
        } else {
            name.clone()
        };

        Self {
            id,
            kind,
            name,
            display_name,
            channel_count: None,
            sample_rate: None,
            dimensions: None,
            frame_rate: None,
        }
    }

    /// Attaches audio properties
    pub fn with_audio(mut self, channel_count: u32, sample_rate: u32) -> Self {
        self.channel_count = Some(channel_count);
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Attaches video properties
    pub fn with_video(mut self, dimensions: (u32, u32), frame_rate: f32) -> Self {
        self.dimensions = Some(dimensions);
        self.frame_rate = Some(frame_rate);
        self
    }
}
