//! Track enumeration and selection
//!
//! Rebuilt from the native track description lists every time the media is
//! (re)parsed. Tracks are addressed by index into the per-kind list; the
//! native "disable" entry (id -1) is not listed.

use crate::native::NativePlayer;
use crate::Result;
use std::fmt::Write as _;
use std::sync::Arc;
use vlc_media_core::{FourCc, TrackDescriptor, TrackKind};

/// Fixed audio format configured until format callbacks take over
pub const DEFAULT_AUDIO_CHANNELS: u32 = 2;
pub const DEFAULT_AUDIO_RATE: u32 = 44_100;

/// Format of an audio track as reported to consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrackFormat {
    pub bits_per_sample: u32,
    pub channels: u32,
    pub sample_rate: u32,
    pub type_name: &'static str,
}

/// Format of a video track as reported to consumers
#[derive(Debug, Clone, PartialEq)]
pub struct VideoTrackFormat {
    pub dim: (u32, u32),
    pub frame_rate: f32,
    pub type_name: &'static str,
}

/// Track lists of the open media
#[derive(Default)]
pub struct MediaTracks {
    player: Option<Arc<dyn NativePlayer>>,
    audio: Vec<TrackDescriptor>,
    caption: Vec<TrackDescriptor>,
    video: Vec<TrackDescriptor>,
}

impl MediaTracks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerates the tracks of `player` and appends a description of every
    /// stream to `info`.
    ///
    /// Also configures the fixed fallback output formats, which replaces any
    /// registered format callbacks; rewire the output afterwards.
    pub fn initialize(&mut self, player: Arc<dyn NativePlayer>, info: &mut String) {
        self.shutdown();

        let (width, height) = player.video_size(0).unwrap_or((0, 0));
        let fps = player.fps();
        player.set_audio_format(FourCc::S16N, DEFAULT_AUDIO_RATE, DEFAULT_AUDIO_CHANNELS);
        player.set_video_format(FourCc::RV32, width, height, width * 4);

        let mut stream = 0;
        for kind in TrackKind::ALL {
            for description in player.track_descriptions(kind) {
                if description.id == -1 {
                    continue;
                }

                let mut track = TrackDescriptor::new(description.id, kind, description.name);
                track = match kind {
                    TrackKind::Audio => track.with_audio(DEFAULT_AUDIO_CHANNELS, DEFAULT_AUDIO_RATE),
                    TrackKind::Video if width > 0 && height > 0 => {
                        track.with_video((width, height), fps)
                    }
                    _ => track,
                };

                let _ = write!(
                    info,
                    "Stream {stream}\n    Type: {kind}\n    Name: {}\n\n",
                    track.name
                );
                stream += 1;

                self.list_mut(kind).push(track);
            }
        }

        tracing::debug!(
            audio = self.audio.len(),
            caption = self.caption.len(),
            video = self.video.len(),
            "tracks initialized"
        );
        self.player = Some(player);
    }

    pub fn shutdown(&mut self) {
        self.player = None;
        self.audio.clear();
        self.caption.clear();
        self.video.clear();
    }

    fn list_mut(&mut self, kind: TrackKind) -> &mut Vec<TrackDescriptor> {
        match kind {
            TrackKind::Audio => &mut self.audio,
            TrackKind::Caption => &mut self.caption,
            TrackKind::Video => &mut self.video,
        }
    }

    pub fn tracks(&self, kind: TrackKind) -> &[TrackDescriptor] {
        match kind {
            TrackKind::Audio => &self.audio,
            TrackKind::Caption => &self.caption,
            TrackKind::Video => &self.video,
        }
    }

    pub fn track(&self, kind: TrackKind, index: usize) -> Option<&TrackDescriptor> {
        self.tracks(kind).get(index)
    }

    pub fn num_tracks(&self, kind: TrackKind) -> usize {
        self.tracks(kind).len()
    }

    /// Every track has exactly one format
    pub fn num_track_formats(&self, kind: TrackKind, index: usize) -> usize {
        usize::from(self.track(kind, index).is_some())
    }

    /// Index of the selected track, `None` if no track is selected
    pub fn selected_track(&self, kind: TrackKind) -> Option<usize> {
        let player = self.player.as_ref()?;
        let id = player.selected_track(kind);
        self.tracks(kind).iter().position(|track| track.id == id)
    }

    /// Selects the track at `index`, or disables the kind for `None`
    pub fn select_track(&mut self, kind: TrackKind, index: Option<usize>) -> Result<()> {
        let player = self.player.as_ref().ok_or(crate::Error::NotOpen)?;
        let id = match index {
            Some(index) => {
                self.track(kind, index)
                    .ok_or(vlc_media_core::Error::InvalidTrack {
                        kind,
                        index: index as i32,
                    })?
                    .id
            }
            None => -1,
        };

        player.select_track(kind, id)?;
        tracing::debug!(%kind, ?index, id, "track selected");
        Ok(())
    }

    pub fn track_display_name(&self, kind: TrackKind, index: usize) -> Option<&str> {
        self.track(kind, index).map(|track| track.display_name.as_str())
    }

    pub fn track_name(&self, kind: TrackKind, index: usize) -> Option<&str> {
        self.track(kind, index).map(|track| track.name.as_str())
    }

    /// Language codes aren't reported by the native engine
    pub fn track_language(&self, _kind: TrackKind, _index: usize) -> &'static str {
        "und"
    }

    /// Format index of the selected track of `kind`
    pub fn track_format(&self, kind: TrackKind) -> Option<usize> {
        self.selected_track(kind).map(|_| 0)
    }

    pub fn audio_track_format(&self, index: usize, format_index: usize) -> Option<AudioTrackFormat> {
        let track = self.track(TrackKind::Audio, index)?;
        if format_index != 0 {
            return None;
        }

        Some(AudioTrackFormat {
            bits_per_sample: 16,
            channels: track.channel_count.unwrap_or(DEFAULT_AUDIO_CHANNELS),
            sample_rate: track.sample_rate.unwrap_or(DEFAULT_AUDIO_RATE),
            type_name: "PCM",
        })
    }

    /// Current video output format; queried live since it changes after parsing
    pub fn video_track_format(&self, index: usize, format_index: usize) -> Option<VideoTrackFormat> {
        self.track(TrackKind::Video, index)?;
        let player = self.player.as_ref()?;
        if format_index != 0 {
            return None;
        }

        Some(VideoTrackFormat {
            dim: player.video_size(0).unwrap_or((0, 0)),
            frame_rate: player.fps(),
            type_name: "Default",
        })
    }

    /// Only format 0 of an existing track can be selected
    pub fn set_track_format(&self, kind: TrackKind, index: usize, format_index: usize) -> bool {
        self.player.is_some() && format_index == 0 && self.track(kind, index).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlayer;

    fn initialized() -> (Arc<MockPlayer>, MediaTracks, String) {
        let player = MockPlayer::new();
        let mut tracks = MediaTracks::new();
        let mut info = String::new();
        tracks.initialize(player.clone(), &mut info);
        (player, tracks, info)
    }

    #[test]
    fn test_initialize_skips_disable_entries() {
        let (_, tracks, _) = initialized();

        assert_eq!(tracks.num_tracks(TrackKind::Audio), 2);
        assert_eq!(tracks.num_tracks(TrackKind::Video), 1);
        assert_eq!(tracks.num_tracks(TrackKind::Caption), 1);
        assert!(tracks.tracks(TrackKind::Audio).iter().all(|track| track.id != -1));
    }

    #[test]
    fn test_display_name_fallback() {
        let (_, tracks, _) = initialized();

        assert_eq!(tracks.track_display_name(TrackKind::Audio, 0), Some("Track 1 - [English]"));
        assert_eq!(tracks.track_display_name(TrackKind::Audio, 1), Some("Audio Track 2"));
        assert_eq!(tracks.track_name(TrackKind::Audio, 1), Some(""));
        assert_eq!(tracks.track_display_name(TrackKind::Audio, 5), None);
        assert_eq!(tracks.track_language(TrackKind::Audio, 0), "und");
    }

    #[test]
    fn test_info_lists_every_stream() {
        let (_, _, info) = initialized();

        assert!(info.starts_with("Stream 0\n    Type: Audio\n    Name: Track 1 - [English]\n\n"));
        assert!(info.contains("Stream 2\n    Type: Caption\n"));
        assert!(info.contains("Stream 3\n    Type: Video\n    Name: Track 1\n"));
    }

    #[test]
    fn test_initialize_sets_fallback_formats() {
        let (player, tracks, _) = initialized();
        let state = player.state.lock();

        assert_eq!(state.audio_format, Some((FourCc::S16N, 44_100, 2)));
        assert_eq!(state.video_format, Some((FourCc::RV32, 640, 360, 2560)));
        drop(state);

        let video = tracks.track(TrackKind::Video, 0).unwrap();
        assert_eq!(video.dimensions, Some((640, 360)));
        assert_eq!(video.frame_rate, Some(25.0));
    }

    #[test]
    fn test_selected_track_maps_native_id_to_index() {
        let (player, mut tracks, _) = initialized();

        assert_eq!(tracks.selected_track(TrackKind::Audio), Some(0));
        assert_eq!(tracks.selected_track(TrackKind::Caption), None);
        assert_eq!(tracks.track_format(TrackKind::Caption), None);

        tracks.select_track(TrackKind::Audio, Some(1)).unwrap();
        assert_eq!(player.selected_track(TrackKind::Audio), 2);
        assert_eq!(tracks.selected_track(TrackKind::Audio), Some(1));

        tracks.select_track(TrackKind::Audio, None).unwrap();
        assert_eq!(player.selected_track(TrackKind::Audio), -1);
    }

    #[test]
    fn test_select_invalid_track_fails() {
        let (player, mut tracks, _) = initialized();

        assert!(tracks.select_track(TrackKind::Video, Some(3)).is_err());
        assert!(!player.called("select_track"));
    }

    #[test]
    fn test_track_formats() {
        let (_, tracks, _) = initialized();

        let audio = tracks.audio_track_format(0, 0).unwrap();
        assert_eq!((audio.channels, audio.sample_rate), (2, 44_100));
        assert!(tracks.audio_track_format(0, 1).is_none());

        let video = tracks.video_track_format(0, 0).unwrap();
        assert_eq!(video.dim, (640, 360));
        assert_eq!(tracks.num_track_formats(TrackKind::Video, 0), 1);
        assert_eq!(tracks.num_track_formats(TrackKind::Video, 1), 0);
        assert!(tracks.set_track_format(TrackKind::Video, 0, 0));
        assert!(!tracks.set_track_format(TrackKind::Video, 0, 1));
    }

    #[test]
    fn test_shutdown_clears_tracks() {
        let (_, mut tracks, _) = initialized();

        tracks.shutdown();
        assert_eq!(tracks.num_tracks(TrackKind::Audio), 0);
        assert_eq!(tracks.selected_track(TrackKind::Audio), None);
        assert!(tracks.select_track(TrackKind::Audio, Some(0)).is_err());
    }
}
