//! Output manager
//!
//! Registers the callback bridge with a playback session for each media kind
//! that has somewhere to go: an attached sink or, if enabled, the sample
//! queues. Sinks can be set at any time, before or after a media is open.

use crate::callbacks::{BridgeStats, CallbackBridge, TimeInfo};
use crate::native::{NativeEngine, NativePlayer};
use crate::settings::{OutputSettings, VideoFallbackPolicy};
use crate::sink::{AudioSink, OverlaySink, TextureSink};
use std::sync::Arc;
use std::time::Duration;
use vlc_media_core::MediaSamples;

pub struct MediaOutput {
    bridge: Arc<CallbackBridge>,
    player: Option<Arc<dyn NativePlayer>>,
}

impl MediaOutput {
    pub fn new(
        engine: Arc<dyn NativeEngine>,
        samples: Arc<MediaSamples>,
        policy: VideoFallbackPolicy,
        output: OutputSettings,
    ) -> Self {
        Self {
            bridge: Arc::new(CallbackBridge::new(engine, samples, policy, output)),
            player: None,
        }
    }

    /// Binds the output to a playback session and registers the callbacks.
    ///
    /// Re-initializing with the running session keeps the formats its native
    /// outputs already negotiated.
    pub fn initialize(&mut self, player: Arc<dyn NativePlayer>, deliver_to_queues: bool) {
        self.unregister();

        self.bridge.attach(Arc::clone(&player), deliver_to_queues);
        self.player = Some(player);

        self.setup_audio_output();
        self.setup_overlay_output();
        self.setup_video_output();
    }

    /// Unregisters every callback. Outputs the native player already started
    /// keep calling in until it is stopped, so buffers stay alive.
    pub fn unregister(&mut self) {
        let Some(player) = self.player.take() else {
            return;
        };

        player.set_audio_callbacks(None);
        player.set_audio_format_callbacks(None);
        player.set_video_callbacks(None);
        player.set_video_format_callbacks(None);
        tracing::debug!("output unregistered");
    }

    /// Forgets negotiated formats and returns every buffer to its pool.
    ///
    /// Only valid once the native player was stopped.
    pub fn release(&mut self) {
        self.unregister();
        self.bridge.release();
        tracing::debug!("output released");
    }

    pub fn is_initialized(&self) -> bool {
        self.player.is_some()
    }

    pub fn set_audio_sink(&mut self, sink: Option<&Arc<dyn AudioSink>>) {
        if self.bridge.set_audio_sink(sink) {
            self.setup_audio_output();
        }
    }

    pub fn set_video_sink(&mut self, sink: Option<&Arc<dyn TextureSink>>) {
        if self.bridge.set_video_sink(sink) {
            self.setup_video_output();
        }
    }

    pub fn set_overlay_sink(&mut self, sink: Option<&Arc<dyn OverlaySink>>) {
        if self.bridge.set_overlay_sink(sink) {
            self.setup_overlay_output();
        }
    }

    /// Publishes the playback clock used to stamp samples
    pub fn update(&self, time: Duration, rate: f32) {
        self.bridge.update_time(time, rate);
    }

    /// Re-baselines the playback clock after playback resumed
    pub fn resume(&self, time: Duration) {
        self.bridge.resume(time);
    }

    pub fn time_info(&self) -> TimeInfo {
        self.bridge.time_info()
    }

    pub fn stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    pub fn outstanding_buffers(&self) -> usize {
        self.bridge.outstanding_buffers()
    }

    pub fn bridge(&self) -> &Arc<CallbackBridge> {
        &self.bridge
    }

    fn setup_audio_output(&self) {
        let Some(player) = &self.player else {
            return;
        };

        if self.bridge.has_audio_destination() {
            player.set_audio_format_callbacks(Some(self.bridge.audio_format_callbacks()));
            player.set_audio_callbacks(Some(self.bridge.audio_callbacks()));
            tracing::debug!("audio output registered");
        } else {
            player.set_audio_callbacks(None);
            player.set_audio_format_callbacks(None);
            tracing::debug!("audio output unregistered");
        }
    }

    fn setup_video_output(&self) {
        let Some(player) = &self.player else {
            return;
        };

        if self.bridge.has_video_destination() {
            player.set_video_format_callbacks(Some(self.bridge.video_format_callbacks()));
            player.set_video_callbacks(Some(self.bridge.video_callbacks()));
            tracing::debug!("video output registered");
        } else {
            player.set_video_callbacks(None);
            player.set_video_format_callbacks(None);
            tracing::debug!("video output unregistered");
        }
    }

    /// Captions are rendered by the native text renderer, which is disabled;
    /// the overlay sink only follows flushes and rate changes.
    fn setup_overlay_output(&self) {
        if self.player.is_some() && self.bridge.overlay_sink().is_some() {
            tracing::debug!("overlay sink attached");
        }
    }
}

impl Drop for MediaOutput {
    fn drop(&mut self) {
        self.release();
    }
}
