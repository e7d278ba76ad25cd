//! Player state machine
//!
//! Owns the native media and playback session of one player, reacts to native
//! events drained from the [`EventQueue`] during [`VlcMediaPlayer::tick`] and
//! interpolates the playback time between the engine's coarse position
//! reports.

use crate::callbacks::BridgeStats;
use crate::events::{EventBroadcaster, EventQueue, MediaEvent};
use crate::native::{EngineEvent, MetaKey, NativeEngine, NativePlayer, NativeState};
use crate::output::MediaOutput;
use crate::settings::{MediaOptions, VlcMediaSettings};
use crate::sink::{AudioSink, OverlaySink, TextureSink};
use crate::source::{Archive, MediaSource};
use crate::tracks::MediaTracks;
use crate::{Error, Result};
use crossbeam_channel::Receiver;
use std::fmt::Write as _;
use std::fs;
use std::io::Cursor;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use vlc_media_core::time::scale_by_rate;
use vlc_media_core::{
    AudioSample, BinarySample, MediaSamples, OverlaySample, TextureSample, TimeRange, TrackKind,
};

/// Rates below this are treated as a request to pause
const RATE_EPSILON: f32 = 1e-4;

/// Highest supported forward playback rate
const MAX_RATE: f32 = 10.0;

/// Consumer-facing player state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Closed,
    Error,
    Opening,
    Preparing,
    Paused,
    Playing,
    Stopped,
}

impl From<NativeState> for MediaState {
    fn from(state: NativeState) -> Self {
        match state {
            NativeState::Opening => MediaState::Opening,
            NativeState::Buffering => MediaState::Preparing,
            NativeState::Playing => MediaState::Playing,
            NativeState::Paused => MediaState::Paused,
            NativeState::NothingSpecial | NativeState::Stopped | NativeState::Ended => {
                MediaState::Stopped
            }
            NativeState::Error => MediaState::Error,
        }
    }
}

/// Interpolated playback time
#[derive(Debug, Default, Clone, Copy)]
struct PlaybackTime {
    /// Last time synchronized with the native engine
    reported: Duration,
    /// Time interpolated since the last synchronization
    drift: Duration,
    /// A seek was issued and the next report may move time backwards
    seek_pending: bool,
}

impl PlaybackTime {
    fn current(&self) -> Duration {
        self.reported.saturating_add(self.drift)
    }

    /// Takes over the native time without ever moving backwards, unless a
    /// seek is pending
    fn resync(&mut self, native: Duration) {
        let current = self.current();
        self.reported = if self.seek_pending {
            native
        } else {
            native.max(current)
        };
        self.drift = Duration::ZERO;
        self.seek_pending = false;
    }

    fn jump(&mut self, time: Duration) {
        self.reported = time;
        self.drift = Duration::ZERO;
        self.seek_pending = true;
    }
}

fn millis(value: i64) -> Duration {
    Duration::from_millis(u64::try_from(value).unwrap_or(0))
}

/// Media player backed by a native LibVLC engine
pub struct VlcMediaPlayer {
    engine: Arc<dyn NativeEngine>,
    // released in declaration order: callbacks first, the media last
    output: MediaOutput,
    tracks: MediaTracks,
    player: Option<Arc<dyn NativePlayer>>,
    source: MediaSource,
    events: EventQueue,
    samples: Arc<MediaSamples>,
    broadcaster: EventBroadcaster,
    time: PlaybackTime,
    desired_rate: f32,
    should_loop: bool,
    options: MediaOptions,
    info: String,
}

impl VlcMediaPlayer {
    pub fn new(engine: Arc<dyn NativeEngine>, settings: &VlcMediaSettings) -> Self {
        let samples = Arc::new(MediaSamples::new());
        let output = MediaOutput::new(
            Arc::clone(&engine),
            Arc::clone(&samples),
            settings.video_fallback,
            settings.output,
        );

        Self {
            source: MediaSource::new(Arc::clone(&engine)),
            engine,
            output,
            tracks: MediaTracks::new(),
            player: None,
            events: EventQueue::new(),
            samples,
            broadcaster: EventBroadcaster::default(),
            time: PlaybackTime::default(),
            desired_rate: 0.0,
            should_loop: false,
            options: MediaOptions::default(),
            info: String::new(),
        }
    }

    // ──────────────────── Open / close ────────────────────

    /// Opens a media by URL. `file://` URLs are played from disk, or read into
    /// memory first if `options.precache_file` is set.
    pub fn open(&mut self, url: &str, options: &MediaOptions) -> bool {
        self.close();

        if url.is_empty() {
            tracing::warn!("cannot open media: empty url");
            return false;
        }

        let opened = match url.strip_prefix("file://") {
            Some(path) if options.precache_file => fs::read(path)
                .map_err(Error::from)
                .and_then(|bytes| {
                    tracing::debug!(path, size = bytes.len(), "precached media file");
                    self.source
                        .open_archive(Box::new(Cursor::new(bytes)), url)
                        .map(|_| ())
                }),
            Some(path) => self.source.open_path(Path::new(path), url).map(|_| ()),
            None => self.source.open_url(url).map(|_| ()),
        };

        self.finish_open(opened, url, options)
    }

    /// Opens a media whose bytes come from `archive`; `url` identifies it
    pub fn open_archive(&mut self, archive: Box<dyn Archive>, url: &str, options: &MediaOptions) -> bool {
        self.close();

        if url.is_empty() {
            tracing::warn!("cannot open archive: empty url");
            return false;
        }

        let opened = self.source.open_archive(archive, url).map(|_| ());
        self.finish_open(opened, url, options)
    }

    fn finish_open(&mut self, opened: Result<()>, url: &str, options: &MediaOptions) -> bool {
        if let Err(e) = opened.and_then(|()| self.initialize_player(options)) {
            tracing::warn!(url, "failed to open media: {e}");
            self.teardown();
            return false;
        }

        tracing::info!(url, "media opened");
        self.broadcaster.send(MediaEvent::MediaOpened);
        true
    }

    fn initialize_player(&mut self, options: &MediaOptions) -> Result<()> {
        let media = self.source.media().ok_or(Error::NotOpen)?;
        let handler = self.events.handler();

        let player = media.create_player()?;
        // stored first so that a failed attach is rolled back by teardown
        self.player = Some(Arc::clone(&player));

        for event in EngineEvent::MEDIA {
            media.attach_event(event, handler)?;
        }
        for event in EngineEvent::PLAYER {
            player.attach_event(event, handler)?;
        }

        self.options = *options;
        self.output.initialize(player, options.deliver_to_queues);
        Ok(())
    }

    /// Closes the media. Does nothing if no media is open.
    pub fn close(&mut self) {
        if self.player.is_none() && self.source.media().is_none() {
            return;
        }

        self.teardown();
        tracing::info!("media closed");

        self.broadcaster.send(MediaEvent::TracksChanged);
        self.broadcaster.send(MediaEvent::MediaClosed);
    }

    /// Releases everything in dependency order: callbacks, events, session,
    /// output buffers, media
    fn teardown(&mut self) {
        self.output.unregister();
        self.tracks.shutdown();

        let handler = self.events.handler();
        if let Some(player) = self.player.take() {
            for event in EngineEvent::PLAYER {
                player.detach_event(event, handler);
            }
            player.stop();
        }
        // started native outputs only let go of their frames once stopped
        self.output.release();
        if let Some(media) = self.source.media() {
            for event in EngineEvent::MEDIA {
                media.detach_event(event, handler);
            }
        }
        self.source.close();

        self.events.clear();
        self.samples.flush();
        self.time = PlaybackTime::default();
        self.desired_rate = 0.0;
        self.info.clear();
    }

    // ──────────────────── Controls ────────────────────

    pub fn state(&self) -> MediaState {
        match &self.player {
            Some(player) => player.state().into(),
            None => MediaState::Closed,
        }
    }

    /// Jumps to `time`. Rejected while the engine is opening, buffering or failed.
    pub fn seek(&mut self, time: Duration) -> bool {
        let Some(player) = &self.player else {
            return false;
        };

        let state = player.state();
        if matches!(
            state,
            NativeState::Opening | NativeState::Buffering | NativeState::Error
        ) {
            tracing::debug!(?state, "seek rejected");
            return false;
        }

        if time != self.time.current() {
            player.set_time(i64::try_from(time.as_millis()).unwrap_or(i64::MAX));
            self.time.jump(time);
            tracing::debug!(?time, "seek");
        }
        true
    }

    /// Changes the playback rate; a rate of zero pauses
    pub fn set_rate(&mut self, rate: f32) -> bool {
        match self.apply_rate(rate) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(rate, "failed to set rate: {e}");
                false
            }
        }
    }

    fn apply_rate(&mut self, rate: f32) -> Result<()> {
        let player = self.player.clone().ok_or(Error::NotOpen)?;
        player.set_rate(rate)?;

        if rate.abs() < RATE_EPSILON {
            let state = player.state();
            if state == NativeState::Playing {
                if !player.can_pause() {
                    return Err(Error::InvalidState(state));
                }
                player.set_pause(true);
            }
        } else if player.state() != NativeState::Playing {
            player.play()?;
        }

        // interpolation restarts from the current time
        let current = self.time.current();
        self.time.reported = current;
        self.time.drift = Duration::ZERO;
        self.desired_rate = rate;
        Ok(())
    }

    /// Current rate, zero unless playing
    pub fn rate(&self) -> f32 {
        match &self.player {
            Some(player) if player.state() == NativeState::Playing => player.rate(),
            _ => 0.0,
        }
    }

    pub fn set_looping(&mut self, looping: bool) -> bool {
        self.should_loop = looping;
        true
    }

    pub fn is_looping(&self) -> bool {
        self.should_loop
    }

    pub fn supported_rates(&self) -> RangeInclusive<f32> {
        0.0..=MAX_RATE
    }

    pub fn supports_rate(&self, rate: f32) -> bool {
        self.supported_rates().contains(&rate)
    }

    pub fn supports_seeking(&self) -> bool {
        self.player.as_ref().is_some_and(|player| player.is_seekable())
    }

    pub fn supports_scrubbing(&self) -> bool {
        self.supports_seeking()
    }

    // ──────────────────── Tick ────────────────────

    /// Processes pending native events and advances the playback time by
    /// `delta` of wall-clock time
    pub fn tick(&mut self, delta: Duration) {
        while let Some(event) = self.events.dequeue() {
            self.handle_event(event);
        }

        let Some(player) = self.player.clone() else {
            return;
        };

        match player.state() {
            NativeState::Playing => {
                let advance = scale_by_rate(delta, self.desired_rate);
                self.time.drift = self.time.drift.saturating_add(advance);
            }
            // no position reports while scrubbing
            NativeState::Paused if !self.time.seek_pending => {
                self.time.reported = millis(player.time());
                self.time.drift = Duration::ZERO;
            }
            _ => {}
        }

        self.output.update(self.time.current(), self.rate());
    }

    fn handle_event(&mut self, event: EngineEvent) {
        tracing::trace!(?event, "native event");
        let Some(player) = self.player.clone() else {
            return;
        };

        match event {
            EngineEvent::ParsedChanged => {
                self.info.clear();
                self.tracks.initialize(Arc::clone(&player), &mut self.info);
                // fixed formats set by the tracks replace the format callbacks
                self.output.initialize(player, self.options.deliver_to_queues);
                self.broadcaster.send(MediaEvent::TracksChanged);
            }
            EngineEvent::EndReached => {
                // the native player can't restart an ended media without a stop
                player.stop();
                self.time = PlaybackTime::default();

                if self.should_loop && self.desired_rate.abs() >= RATE_EPSILON {
                    let rate = self.desired_rate;
                    if !self.set_rate(rate) {
                        tracing::warn!(rate, "failed to restart looping media");
                    }
                } else {
                    self.broadcaster.send(MediaEvent::PlaybackSuspended);
                }
                self.broadcaster.send(MediaEvent::PlaybackEndReached);
            }
            EngineEvent::Playing => {
                self.time.resync(millis(player.time()));
                self.output.resume(self.time.current());
                self.broadcaster.send(MediaEvent::PlaybackResumed);
            }
            EngineEvent::Paused => {
                self.time.resync(millis(player.time()));
                self.broadcaster.send(MediaEvent::PlaybackSuspended);
            }
            EngineEvent::Stopped => {
                self.broadcaster.send(MediaEvent::PlaybackSuspended);
            }
            EngineEvent::PositionChanged => {
                self.time.resync(millis(player.time()));
            }
            EngineEvent::EncounteredError => {
                tracing::warn!(url = self.source.url(), "native playback error");
            }
            EngineEvent::MetaChanged => self.publish_metadata(),
        }
    }

    /// Publishes the media's meta fields as `key=value` lines
    fn publish_metadata(&mut self) {
        let Some(media) = self.source.media() else {
            return;
        };

        let mut text = String::new();
        for key in MetaKey::ALL {
            if let Some(value) = media.meta(key) {
                let _ = writeln!(text, "{}={}", key.name(), value);
            }
        }
        if text.is_empty() {
            return;
        }

        self.samples.add_metadata(Arc::new(BinarySample {
            data: text.into_bytes(),
            time: self.time.current(),
            duration: Duration::ZERO,
        }));
        self.broadcaster.send(MediaEvent::MetadataChanged);
    }

    // ──────────────────── Samples and sinks ────────────────────

    pub fn subscribe(&mut self) -> Receiver<MediaEvent> {
        self.broadcaster.subscribe()
    }

    pub fn samples(&self) -> &Arc<MediaSamples> {
        &self.samples
    }

    pub fn fetch_audio(&self, range: &TimeRange) -> Option<Arc<AudioSample>> {
        self.samples.fetch_audio(range)
    }

    pub fn fetch_video(&self, range: &TimeRange) -> Option<Arc<TextureSample>> {
        self.samples.fetch_video(range)
    }

    /// Always `None` for now; caption decoding is not wired to the queues
    pub fn fetch_caption(&self, range: &TimeRange) -> Option<Arc<OverlaySample>> {
        self.samples.fetch_caption(range)
    }

    pub fn fetch_metadata(&self, range: &TimeRange) -> Option<Arc<BinarySample>> {
        self.samples.fetch_metadata(range)
    }

    pub fn set_audio_sink(&mut self, sink: Option<&Arc<dyn AudioSink>>) {
        self.output.set_audio_sink(sink);
    }

    pub fn set_video_sink(&mut self, sink: Option<&Arc<dyn TextureSink>>) {
        self.output.set_video_sink(sink);
    }

    pub fn set_overlay_sink(&mut self, sink: Option<&Arc<dyn OverlaySink>>) {
        self.output.set_overlay_sink(sink);
    }

    // ──────────────────── Tracks ────────────────────

    pub fn tracks(&self) -> &MediaTracks {
        &self.tracks
    }

    pub fn select_track(&mut self, kind: TrackKind, index: Option<usize>) -> bool {
        match self.tracks.select_track(kind, index) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%kind, ?index, "failed to select track: {e}");
                false
            }
        }
    }

    // ──────────────────── Info ────────────────────

    pub fn time(&self) -> Duration {
        self.time.current()
    }

    pub fn duration(&self) -> Duration {
        match &self.player {
            Some(player) => {
                let length = player.length();
                if length > 0 {
                    millis(length)
                } else {
                    self.source.duration().unwrap_or_default()
                }
            }
            None => Duration::ZERO,
        }
    }

    /// Description of every stream of the open media
    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn url(&self) -> &str {
        self.source.url()
    }

    /// Native decoding statistics as text
    pub fn stats(&self) -> String {
        self.source
            .media()
            .and_then(|media| media.stats())
            .map(|stats| stats.to_string())
            .unwrap_or_default()
    }

    pub fn bridge_stats(&self) -> BridgeStats {
        self.output.stats()
    }

    pub fn outstanding_buffers(&self) -> usize {
        self.output.outstanding_buffers()
    }

    pub fn engine(&self) -> &Arc<dyn NativeEngine> {
        &self.engine
    }
}

impl Drop for VlcMediaPlayer {
    fn drop(&mut self) {
        self.close();
    }
}
