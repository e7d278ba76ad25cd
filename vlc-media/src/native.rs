//! Native engine boundary
//!
//! The player talks to the playback engine exclusively through these traits.
//! [`crate::libvlc::LibVlcEngine`] implements them on top of the C bindings;
//! tests implement them with a recording mock that drives the registered
//! callbacks the way the decode thread would.
//!
//! Callback registrations carry raw C function pointers plus an opaque
//! context pointer. The engine stores them and invokes them on its own
//! threads until they are replaced or cleared.

use crate::vlc_bindings::*;
use crate::Result;
use std::fmt;
use std::os::raw::{c_int, c_void};
use std::path::Path;
use std::sync::Arc;
use vlc_media_core::{FourCc, TrackKind};

/// Playback engine instance
pub trait NativeEngine: Send + Sync {
    /// Opens a media by URL or MRL
    fn media_from_location(&self, url: &str) -> Result<Box<dyn NativeMedia>>;

    /// Opens a local file by path
    fn media_from_path(&self, path: &Path) -> Result<Box<dyn NativeMedia>>;

    /// Opens a media that reads its bytes through `callbacks`
    fn media_from_callbacks(&self, callbacks: StreamCallbacks) -> Result<Box<dyn NativeMedia>>;

    /// Current value of the engine clock in microseconds
    fn clock(&self) -> i64;

    /// Number of planes of a chroma, `None` if the chroma is unknown
    fn chroma_plane_count(&self, chroma: FourCc) -> Option<u32>;

    /// Engine version string
    fn version(&self) -> String;

    /// Time until a presentation timestamp is due, in microseconds
    fn delay(&self, pts: i64) -> i64 {
        pts - self.clock()
    }
}

/// An opened media source
pub trait NativeMedia: Send {
    /// Creates a playback session bound to this media
    fn create_player(&self) -> Result<Arc<dyn NativePlayer>>;

    fn attach_event(&self, event: EngineEvent, handler: EventHandler) -> Result<()>;

    fn detach_event(&self, event: EngineEvent, handler: EventHandler);

    /// Duration in milliseconds, negative if unknown
    fn duration_ms(&self) -> i64;

    fn meta(&self, key: MetaKey) -> Option<String>;

    fn stats(&self) -> Option<MediaStats>;
}

/// A playback session.
///
/// Shared between the player and the callback bridge, which queries output
/// geometry from the decode thread.
pub trait NativePlayer: Send + Sync {
    fn attach_event(&self, event: EngineEvent, handler: EventHandler) -> Result<()>;

    fn detach_event(&self, event: EngineEvent, handler: EventHandler);

    // ── Transport ──

    fn play(&self) -> Result<()>;

    fn set_pause(&self, pause: bool);

    fn stop(&self);

    fn set_rate(&self, rate: f32) -> Result<()>;

    fn rate(&self) -> f32;

    /// Jumps to `time_ms` milliseconds
    fn set_time(&self, time_ms: i64);

    /// Current time in milliseconds, negative if unknown
    fn time(&self) -> i64;

    /// Length in milliseconds, negative if unknown
    fn length(&self) -> i64;

    fn state(&self) -> NativeState;

    fn is_seekable(&self) -> bool;

    fn can_pause(&self) -> bool;

    fn fps(&self) -> f32;

    /// Size of video output `index`, if a video output exists
    fn video_size(&self, index: u32) -> Option<(u32, u32)>;

    // ── Tracks ──

    fn track_descriptions(&self, kind: TrackKind) -> Vec<TrackDescription>;

    /// Native id of the selected track, negative if none
    fn selected_track(&self, kind: TrackKind) -> i32;

    fn select_track(&self, kind: TrackKind, id: i32) -> Result<()>;

    // ── Output registration ──

    fn set_audio_callbacks(&self, callbacks: Option<AudioCallbacks>);

    fn set_audio_format_callbacks(&self, callbacks: Option<AudioFormatCallbacks>);

    /// Fixed audio output format, used when no format callbacks are set
    fn set_audio_format(&self, format: FourCc, rate: u32, channels: u32);

    fn set_video_callbacks(&self, callbacks: Option<VideoCallbacks>);

    fn set_video_format_callbacks(&self, callbacks: Option<VideoFormatCallbacks>);

    /// Fixed video output format, used when no format callbacks are set
    fn set_video_format(&self, chroma: FourCc, width: u32, height: u32, pitch: u32);
}

/// Native player states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeState {
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

impl NativeState {
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            LIBVLC_OPENING => Self::Opening,
            LIBVLC_BUFFERING => Self::Buffering,
            LIBVLC_PLAYING => Self::Playing,
            LIBVLC_PAUSED => Self::Paused,
            LIBVLC_STOPPED => Self::Stopped,
            LIBVLC_ENDED => Self::Ended,
            LIBVLC_ERROR_STATE => Self::Error,
            _ => Self::NothingSpecial,
        }
    }
}

/// Native events the player subscribes to.
///
/// Only this value crosses from the native event thread to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    MetaChanged,
    ParsedChanged,
    Playing,
    Paused,
    Stopped,
    EndReached,
    EncounteredError,
    PositionChanged,
}

impl EngineEvent {
    /// Events attached on the media
    pub const MEDIA: [EngineEvent; 2] = [EngineEvent::ParsedChanged, EngineEvent::MetaChanged];

    /// Events attached on the player
    pub const PLAYER: [EngineEvent; 6] = [
        EngineEvent::EndReached,
        EngineEvent::Playing,
        EngineEvent::Paused,
        EngineEvent::PositionChanged,
        EngineEvent::Stopped,
        EngineEvent::EncounteredError,
    ];

    pub fn to_raw(self) -> c_int {
        match self {
            Self::MetaChanged => LIBVLC_MEDIA_META_CHANGED,
            Self::ParsedChanged => LIBVLC_MEDIA_PARSED_CHANGED,
            Self::Playing => LIBVLC_MEDIA_PLAYER_PLAYING,
            Self::Paused => LIBVLC_MEDIA_PLAYER_PAUSED,
            Self::Stopped => LIBVLC_MEDIA_PLAYER_STOPPED,
            Self::EndReached => LIBVLC_MEDIA_PLAYER_END_REACHED,
            Self::EncounteredError => LIBVLC_MEDIA_PLAYER_ENCOUNTERED_ERROR,
            Self::PositionChanged => LIBVLC_MEDIA_PLAYER_POSITION_CHANGED,
        }
    }

    pub fn from_raw(raw: c_int) -> Option<Self> {
        let event = match raw {
            LIBVLC_MEDIA_META_CHANGED => Self::MetaChanged,
            LIBVLC_MEDIA_PARSED_CHANGED => Self::ParsedChanged,
            LIBVLC_MEDIA_PLAYER_PLAYING => Self::Playing,
            LIBVLC_MEDIA_PLAYER_PAUSED => Self::Paused,
            LIBVLC_MEDIA_PLAYER_STOPPED => Self::Stopped,
            LIBVLC_MEDIA_PLAYER_END_REACHED => Self::EndReached,
            LIBVLC_MEDIA_PLAYER_ENCOUNTERED_ERROR => Self::EncounteredError,
            LIBVLC_MEDIA_PLAYER_POSITION_CHANGED => Self::PositionChanged,
            _ => return None,
        };
        Some(event)
    }
}

/// Media meta fields published as metadata samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKey {
    Title,
    Artist,
    Album,
    Genre,
    Date,
    Description,
}

impl MetaKey {
    pub const ALL: [MetaKey; 6] = [
        MetaKey::Title,
        MetaKey::Artist,
        MetaKey::Album,
        MetaKey::Genre,
        MetaKey::Date,
        MetaKey::Description,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Genre => "genre",
            Self::Date => "date",
            Self::Description => "description",
        }
    }

    pub fn to_raw(self) -> c_int {
        match self {
            Self::Title => LIBVLC_META_TITLE,
            Self::Artist => LIBVLC_META_ARTIST,
            Self::Album => LIBVLC_META_ALBUM,
            Self::Genre => LIBVLC_META_GENRE,
            Self::Date => LIBVLC_META_DATE,
            Self::Description => LIBVLC_META_DESCRIPTION,
        }
    }
}

/// One entry of a native track description list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescription {
    pub id: i32,
    pub name: String,
}

/// Decoder statistics of a media
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MediaStats {
    pub decoded_audio: i32,
    pub decoded_video: i32,
    pub displayed_pictures: i32,
    pub lost_pictures: i32,
    pub played_audio_buffers: i32,
    pub lost_audio_buffers: i32,
    pub input_bitrate: f32,
}

impl fmt::Display for MediaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Decoded Video: {}", self.decoded_video)?;
        writeln!(f, "Displayed Pictures: {}", self.displayed_pictures)?;
        writeln!(f, "Lost Pictures: {}", self.lost_pictures)?;
        writeln!(f, "Decoded Audio: {}", self.decoded_audio)?;
        writeln!(f, "Played Audio Buffers: {}", self.played_audio_buffers)?;
        writeln!(f, "Lost Audio Buffers: {}", self.lost_audio_buffers)?;
        write!(f, "Input Bitrate: {:.3}", self.input_bitrate)
    }
}

impl From<libvlc_media_stats_t> for MediaStats {
    fn from(raw: libvlc_media_stats_t) -> Self {
        Self {
            decoded_audio: raw.i_decoded_audio,
            decoded_video: raw.i_decoded_video,
            displayed_pictures: raw.i_displayed_pictures,
            lost_pictures: raw.i_lost_pictures,
            played_audio_buffers: raw.i_played_abuffers,
            lost_audio_buffers: raw.i_lost_abuffers,
            input_bitrate: raw.f_input_bitrate,
        }
    }
}

// ──────────────────── Callback registrations ────────────────────

/// Event-manager callback plus its user data
#[derive(Clone, Copy)]
pub struct EventHandler {
    pub callback: libvlc_callback_t,
    pub user_data: *mut c_void,
}

/// Audio sample callbacks plus the context passed to each of them
#[derive(Clone, Copy)]
pub struct AudioCallbacks {
    pub play: libvlc_audio_play_cb,
    pub pause: Option<libvlc_audio_pause_cb>,
    pub resume: Option<libvlc_audio_resume_cb>,
    pub flush: Option<libvlc_audio_flush_cb>,
    pub drain: Option<libvlc_audio_drain_cb>,
    pub opaque: *mut c_void,
}

#[derive(Clone, Copy)]
pub struct AudioFormatCallbacks {
    pub setup: libvlc_audio_setup_cb,
    pub cleanup: Option<libvlc_audio_cleanup_cb>,
}

/// Video buffer callbacks plus the context passed to each of them
#[derive(Clone, Copy)]
pub struct VideoCallbacks {
    pub lock: libvlc_video_lock_cb,
    pub unlock: Option<libvlc_video_unlock_cb>,
    pub display: Option<libvlc_video_display_cb>,
    pub opaque: *mut c_void,
}

#[derive(Clone, Copy)]
pub struct VideoFormatCallbacks {
    pub setup: libvlc_video_format_cb,
    pub cleanup: Option<libvlc_video_cleanup_cb>,
}

/// Byte-stream callbacks for custom media input
#[derive(Clone, Copy)]
pub struct StreamCallbacks {
    pub open: libvlc_media_open_cb,
    pub read: libvlc_media_read_cb,
    pub seek: Option<libvlc_media_seek_cb>,
    pub close: Option<libvlc_media_close_cb>,
    pub opaque: *mut c_void,
}

// SAFETY: the context pointers refer to objects that are Sync (the callback
// bridge, the archive reader, the event sender) and outlive the registration;
// the registering component clears the registration before dropping them.
unsafe impl Send for EventHandler {}
unsafe impl Sync for EventHandler {}
unsafe impl Send for AudioCallbacks {}
unsafe impl Sync for AudioCallbacks {}
unsafe impl Send for VideoCallbacks {}
unsafe impl Sync for VideoCallbacks {}
unsafe impl Send for StreamCallbacks {}
unsafe impl Sync for StreamCallbacks {}
