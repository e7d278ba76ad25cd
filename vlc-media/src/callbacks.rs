//! Callback bridge between the native decode thread and the consumer
//!
//! The native engine calls the `extern "C"` trampolines at the bottom of this
//! file on its own threads. Each trampoline recovers the [`CallbackBridge`]
//! from the opaque context pointer and forwards to a safe method, which either
//! hands out a buffer, publishes a sample or records a negotiated format.
//!
//! Contract with the native engine:
//! - a null context is a no-op (callbacks may race with teardown);
//! - video lock always yields a writable plane as large as the last
//!   negotiated frame, falling back to a malloc'd throwaway buffer with a null
//!   picture handle;
//! - no trampoline unwinds into native code.

use crate::native::{
    AudioCallbacks, AudioFormatCallbacks, NativeEngine, NativePlayer, VideoCallbacks,
    VideoFormatCallbacks,
};
use crate::negotiate::{negotiate_audio, negotiate_video, AudioFormat, VideoFormat};
use crate::settings::{OutputSettings, VideoFallbackPolicy};
use crate::sink::{AudioFrames, AudioSink, OverlaySink, TextureSink};
use crate::vlc_bindings::PICTURE_PLANE_MAX;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::panic;
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use vlc_media_core::time::frames_duration;
use vlc_media_core::{AudioSample, FourCc, MediaSamples, SamplePool, TextureSample};

/// Unlocked frames waiting for display beyond this count are dropped, oldest first
const MAX_UNDISPLAYED_FRAMES: usize = 8;

/// Playback clock shared with the decode thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInfo {
    /// Current media time
    pub time: Duration,
    /// Current playback rate
    pub rate: f32,
    /// Media time at which the current rate took effect
    pub start_offset: Duration,
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            time: Duration::ZERO,
            rate: 0.0,
            start_offset: Duration::ZERO,
        }
    }
}

impl TimeInfo {
    /// Wall-clock time since the start offset
    pub fn timecode(&self) -> Duration {
        let elapsed = self.time.saturating_sub(self.start_offset);
        if self.rate > 0.0 {
            elapsed.div_f64(self.rate as f64)
        } else {
            elapsed
        }
    }
}

/// Counters of bridge traffic
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    pub audio_blocks: u64,
    pub dropped_audio_blocks: u64,
    pub video_frames: u64,
    pub duplicate_frames: u64,
    pub throwaway_frames: u64,
}

#[derive(Default)]
struct Counters {
    audio_blocks: AtomicU64,
    dropped_audio_blocks: AtomicU64,
    video_frames: AtomicU64,
    duplicate_frames: AtomicU64,
    throwaway_frames: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct Sinks {
    audio: Option<Weak<dyn AudioSink>>,
    video: Option<Weak<dyn TextureSink>>,
    overlay: Option<Weak<dyn OverlaySink>>,
}

/// A pooled frame between lock and display
struct FrameSlot {
    buffer: Option<vlc_media_core::Pooled<Vec<u8>>>,
    unlocked: bool,
    displayed: bool,
}

#[derive(Default)]
struct VideoState {
    format: Option<VideoFormat>,
    /// Bytes per frame of the last accepted format, kept across cleanup and release
    frame_size: usize,
    frames: HashMap<usize, FrameSlot>,
    next_token: usize,
    last_displayed: Option<Duration>,
}

impl VideoState {
    fn clear(&mut self) {
        self.frames.clear();
        self.last_displayed = None;
    }

    /// Drops the oldest frames that were unlocked but never displayed
    fn evict_undisplayed(&mut self) {
        loop {
            let mut pending = self
                .frames
                .iter()
                .filter(|(_, slot)| slot.unlocked && !slot.displayed)
                .map(|(token, _)| *token);

            let Some(first) = pending.next() else { return };
            let (count, oldest) = pending.fold((1, first), |(count, oldest), token| {
                (count + 1, oldest.min(token))
            });

            if count <= MAX_UNDISPLAYED_FRAMES {
                return;
            }
            tracing::trace!(token = oldest, "dropping undisplayed frame");
            self.frames.remove(&oldest);
        }
    }
}

/// Buffer handed to the decoder by [`CallbackBridge::video_lock`]
#[derive(Debug, Clone, Copy)]
pub struct LockedFrame {
    /// Handle passed back to unlock and display; null for throwaway buffers
    pub picture: *mut c_void,
    /// First plane to decode into
    pub plane: *mut c_void,
    /// Writable bytes at `plane`
    pub len: usize,
}

/// Receives native audio/video callbacks and turns them into samples.
///
/// Shared through an `Arc`. Native outputs that are already running keep
/// calling in after the callbacks were unregistered, until the player is
/// stopped, so negotiated formats and locked frames outlive registration.
pub struct CallbackBridge {
    engine: Arc<dyn NativeEngine>,
    player: Mutex<Option<Arc<dyn NativePlayer>>>,
    samples: Arc<MediaSamples>,
    audio_pool: SamplePool<Vec<u8>>,
    video_pool: SamplePool<Vec<u8>>,
    policy: VideoFallbackPolicy,
    deliver_to_queues: AtomicBool,
    sinks: Mutex<Sinks>,
    audio: Mutex<Option<AudioFormat>>,
    video: Mutex<VideoState>,
    time: Mutex<TimeInfo>,
    counters: Counters,
}

impl CallbackBridge {
    pub fn new(
        engine: Arc<dyn NativeEngine>,
        samples: Arc<MediaSamples>,
        policy: VideoFallbackPolicy,
        output: OutputSettings,
    ) -> Self {
        Self {
            engine,
            player: Mutex::new(None),
            samples,
            audio_pool: SamplePool::new(output.audio_pool_capacity),
            video_pool: SamplePool::new(output.video_pool_capacity),
            policy,
            deliver_to_queues: AtomicBool::new(true),
            sinks: Mutex::new(Sinks::default()),
            audio: Mutex::new(None),
            video: Mutex::new(VideoState {
                next_token: 1,
                ..Default::default()
            }),
            time: Mutex::new(TimeInfo::default()),
            counters: Counters::default(),
        }
    }

    // ──────────────────── Wiring ────────────────────

    /// Binds the bridge to a playback session
    pub fn attach(&self, player: Arc<dyn NativePlayer>, deliver_to_queues: bool) {
        self.deliver_to_queues.store(deliver_to_queues, Ordering::Release);
        *self.player.lock() = Some(player);
    }

    /// Unbinds the session and forgets every format and buffer.
    ///
    /// Must only be called once the native player was stopped.
    pub fn release(&self) {
        self.player.lock().take();
        self.audio.lock().take();

        let mut video = self.video.lock();
        video.format = None;
        video.clear();
        drop(video);

        self.audio_pool.reset();
        self.video_pool.reset();
        *self.time.lock() = TimeInfo::default();

        if let Some(sink) = self.audio_sink() {
            sink.flush(false);
        }
        if let Some(sink) = self.video_sink() {
            sink.flush(false);
        }
        if let Some(sink) = self.overlay_sink() {
            sink.flush(false);
        }
    }

    pub fn deliver_to_queues(&self) -> bool {
        self.deliver_to_queues.load(Ordering::Acquire)
    }

    fn opaque(self: &Arc<Self>) -> *mut c_void {
        Arc::as_ptr(self) as *mut c_void
    }

    pub fn audio_callbacks(self: &Arc<Self>) -> AudioCallbacks {
        AudioCallbacks {
            play: handle_audio_play,
            pause: Some(handle_audio_pause),
            resume: Some(handle_audio_resume),
            flush: Some(handle_audio_flush),
            drain: Some(handle_audio_drain),
            opaque: self.opaque(),
        }
    }

    pub fn audio_format_callbacks(&self) -> AudioFormatCallbacks {
        AudioFormatCallbacks {
            setup: handle_audio_setup,
            cleanup: Some(handle_audio_cleanup),
        }
    }

    pub fn video_callbacks(self: &Arc<Self>) -> VideoCallbacks {
        VideoCallbacks {
            lock: handle_video_lock,
            unlock: Some(handle_video_unlock),
            display: Some(handle_video_display),
            opaque: self.opaque(),
        }
    }

    pub fn video_format_callbacks(&self) -> VideoFormatCallbacks {
        VideoFormatCallbacks {
            setup: handle_video_setup,
            cleanup: Some(handle_video_cleanup),
        }
    }

    // ──────────────────── Sinks ────────────────────

    pub fn audio_sink(&self) -> Option<Arc<dyn AudioSink>> {
        self.sinks.lock().audio.as_ref()?.upgrade()
    }

    pub fn video_sink(&self) -> Option<Arc<dyn TextureSink>> {
        self.sinks.lock().video.as_ref()?.upgrade()
    }

    pub fn overlay_sink(&self) -> Option<Arc<dyn OverlaySink>> {
        self.sinks.lock().overlay.as_ref()?.upgrade()
    }

    /// Replaces the audio sink, flushing the previous one with shutdown
    /// semantics. Returns whether the sink changed.
    pub fn set_audio_sink(&self, sink: Option<&Arc<dyn AudioSink>>) -> bool {
        let new = sink.map(Arc::downgrade);
        let mut sinks = self.sinks.lock();
        if same_sink(&sinks.audio, &new) {
            return false;
        }
        let old = std::mem::replace(&mut sinks.audio, new);
        drop(sinks);

        if let Some(old) = old.and_then(|old| old.upgrade()) {
            old.flush(true);
        }
        if let Some(sink) = sink {
            sink.set_rate(self.time.lock().rate);
        }
        true
    }

    pub fn set_video_sink(&self, sink: Option<&Arc<dyn TextureSink>>) -> bool {
        let new = sink.map(Arc::downgrade);
        let mut sinks = self.sinks.lock();
        if same_sink(&sinks.video, &new) {
            return false;
        }
        let old = std::mem::replace(&mut sinks.video, new);
        drop(sinks);

        if let Some(old) = old.and_then(|old| old.upgrade()) {
            old.flush(true);
        }
        true
    }

    pub fn set_overlay_sink(&self, sink: Option<&Arc<dyn OverlaySink>>) -> bool {
        let new = sink.map(Arc::downgrade);
        let mut sinks = self.sinks.lock();
        if same_sink(&sinks.overlay, &new) {
            return false;
        }
        let old = std::mem::replace(&mut sinks.overlay, new);
        drop(sinks);

        if let Some(old) = old.and_then(|old| old.upgrade()) {
            old.flush(true);
        }
        true
    }

    pub fn has_audio_destination(&self) -> bool {
        self.deliver_to_queues() || self.audio_sink().is_some()
    }

    pub fn has_video_destination(&self) -> bool {
        self.deliver_to_queues() || self.video_sink().is_some()
    }

    // ──────────────────── Time ────────────────────

    pub fn time_info(&self) -> TimeInfo {
        *self.time.lock()
    }

    /// Publishes the consumer's current time and rate.
    ///
    /// A rate change flushes the sinks and starts a new time code segment.
    pub fn update_time(&self, time: Duration, rate: f32) {
        let mut info = self.time.lock();
        let rate_changed = info.rate != rate;
        info.time = time;
        if rate_changed {
            info.rate = rate;
            info.start_offset = time;
        }
        drop(info);

        if !rate_changed {
            return;
        }

        tracing::debug!(rate, ?time, "output rate changed");
        if let Some(sink) = self.audio_sink() {
            sink.flush(false);
            sink.set_rate(rate);
        }
        if let Some(sink) = self.video_sink() {
            sink.flush(false);
        }
        if let Some(sink) = self.overlay_sink() {
            sink.flush(false);
        }
    }

    /// Re-baselines the clock when playback resumes at `time`
    pub fn resume(&self, time: Duration) {
        let mut info = self.time.lock();
        info.time = time;
        info.start_offset = time;
        drop(info);

        self.video.lock().last_displayed = None;
    }

    pub fn stats(&self) -> BridgeStats {
        let counters = &self.counters;
        BridgeStats {
            audio_blocks: counters.audio_blocks.load(Ordering::Relaxed),
            dropped_audio_blocks: counters.dropped_audio_blocks.load(Ordering::Relaxed),
            video_frames: counters.video_frames.load(Ordering::Relaxed),
            duplicate_frames: counters.duplicate_frames.load(Ordering::Relaxed),
            throwaway_frames: counters.throwaway_frames.load(Ordering::Relaxed),
        }
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        *self.audio.lock()
    }

    pub fn video_format(&self) -> Option<VideoFormat> {
        self.video.lock().format
    }

    /// Buffers currently on loan from the audio and video pools
    pub fn outstanding_buffers(&self) -> usize {
        self.audio_pool.outstanding() + self.video_pool.outstanding()
    }

    fn player(&self) -> Option<Arc<dyn NativePlayer>> {
        self.player.lock().clone()
    }

    // ──────────────────── Audio ────────────────────

    /// Negotiates the PCM format. Returns false if nobody would consume audio.
    pub fn audio_setup(&self, format: &mut FourCc, rate: &mut u32, channels: &mut u32) -> bool {
        if !self.has_audio_destination() {
            tracing::debug!("no audio destination, rejecting audio setup");
            return false;
        }

        let negotiated = negotiate_audio(format, *rate, channels);
        tracing::debug!(
            format = %format,
            rate = *rate,
            channels = *channels,
            "audio format negotiated"
        );
        *self.audio.lock() = Some(negotiated);
        true
    }

    pub fn audio_cleanup(&self) {
        self.audio.lock().take();
        if let Some(sink) = self.audio_sink() {
            sink.flush(true);
        }
    }

    /// Size in bytes of `frames` frames in the negotiated format
    pub fn audio_buffer_size(&self, frames: u32) -> Option<usize> {
        self.audio.lock().map(|format| format.buffer_size(frames))
    }

    /// Delivers a block of decoded audio.
    ///
    /// `data` belongs to the decoder and is not retained past this call.
    pub fn audio_play(&self, data: &[u8], frames: u32, pts: i64) {
        let Some(format) = *self.audio.lock() else {
            return;
        };

        let delay = self.engine.delay(pts);
        let time = offset_by_micros(self.time.lock().time, delay);
        let duration = frames_duration(frames, format.sample_rate);

        if let Some(sink) = self.audio_sink() {
            sink.play_samples(&AudioFrames {
                data,
                frames,
                channels: format.channels,
                format: format.format,
                sample_rate: format.sample_rate,
                time,
                duration,
            });
            Counters::bump(&self.counters.audio_blocks);
            return;
        }

        if !self.deliver_to_queues() {
            return;
        }

        let Some(buffer) = self.audio_pool.acquire() else {
            Counters::bump(&self.counters.dropped_audio_blocks);
            return;
        };

        let sample = AudioSample::new(
            buffer,
            data,
            frames,
            format.channels,
            format.format,
            format.sample_rate,
            time,
            duration,
        );
        self.samples.add_audio(Arc::new(sample));
        Counters::bump(&self.counters.audio_blocks);
    }

    pub fn audio_pause(&self) {
        if let Some(sink) = self.audio_sink() {
            sink.pause();
        }
    }

    pub fn audio_resume(&self) {
        if let Some(sink) = self.audio_sink() {
            sink.resume();
        }
    }

    /// Discards queued audio
    pub fn audio_flush(&self) {
        self.samples.flush_audio();
        if let Some(sink) = self.audio_sink() {
            sink.flush(false);
        }
    }

    pub fn audio_drain(&self) {
        if let Some(sink) = self.audio_sink() {
            sink.drain();
        }
    }

    // ──────────────────── Video ────────────────────

    /// Negotiates the frame layout and reports the first plane's pitch and
    /// line count. Returns false to reject the format.
    pub fn video_setup(
        &self,
        chroma: &mut FourCc,
        width: &mut u32,
        height: &mut u32,
        pitch: &mut u32,
        lines: &mut u32,
    ) -> bool {
        let Some(player) = self.player() else {
            return false;
        };

        let requested = *chroma;
        let negotiated = negotiate_video(
            chroma,
            width,
            height,
            player.video_size(0),
            player.fps(),
            &self.policy,
            |chroma| self.engine.chroma_plane_count(chroma),
        );

        let mut video = self.video.lock();
        video.clear();
        video.format = negotiated;
        if let Some(format) = negotiated {
            video.frame_size = format.buffer_size();
        }
        drop(video);

        match negotiated {
            Some(format) => {
                *pitch = format.stride;
                *lines = format.buffer_dim.1;
                tracing::debug!(
                    requested = %requested,
                    chroma = %format.chroma,
                    width = format.buffer_dim.0,
                    height = format.buffer_dim.1,
                    stride = format.stride,
                    "video format negotiated"
                );
                true
            }
            None => {
                tracing::warn!(chroma = %requested, "video format rejected");
                false
            }
        }
    }

    pub fn video_cleanup(&self) {
        let mut video = self.video.lock();
        video.format = None;
        video.clear();
        drop(video);

        self.video_pool.reset();
    }

    /// Hands the decoder a buffer for the next frame.
    ///
    /// Without a negotiated format, a destination or a free pooled buffer,
    /// a throwaway buffer of the last negotiated frame size is allocated and
    /// the picture handle is null.
    pub fn video_lock(&self) -> LockedFrame {
        let has_destination = self.has_video_destination();
        let mut video = self.video.lock();

        let Some(format) = video.format else {
            tracing::trace!(size = video.frame_size, "lock without a video format");
            return self.throwaway_frame(video.frame_size);
        };
        let size = format.buffer_size();

        if !has_destination {
            return self.throwaway_frame(size);
        }

        let Some(mut buffer) = self.video_pool.acquire() else {
            return self.throwaway_frame(size);
        };
        buffer.resize(size, 0);
        let plane = buffer.as_mut_ptr() as *mut c_void;

        let token = video.next_token;
        video.next_token = video.next_token.wrapping_add(1).max(1);
        video.frames.insert(
            token,
            FrameSlot {
                buffer: Some(buffer),
                unlocked: false,
                displayed: false,
            },
        );

        LockedFrame {
            picture: token as *mut c_void,
            plane,
            len: size,
        }
    }

    fn throwaway_frame(&self, size: usize) -> LockedFrame {
        Counters::bump(&self.counters.throwaway_frames);
        // SAFETY: plain allocation, released by `release_throwaway`
        let len = size.max(1);
        let plane = unsafe { libc::malloc(len) };
        LockedFrame {
            picture: ptr::null_mut(),
            plane,
            len,
        }
    }

    /// The decoder finished writing the frame with handle `token`
    pub fn video_unlock(&self, token: usize) {
        let mut video = self.video.lock();
        let Some(slot) = video.frames.get_mut(&token) else {
            return;
        };

        slot.unlocked = true;
        if slot.displayed {
            video.frames.remove(&token);
        } else {
            video.evict_undisplayed();
        }
    }

    /// Publishes the frame with handle `token`, stamped with the current time.
    ///
    /// A frame stamped with the same time as the previous one is a native
    /// clock resync artifact and is dropped.
    pub fn video_display(&self, token: usize) {
        let info = self.time_info();
        let mut video = self.video.lock();

        let Some(format) = video.format else {
            return;
        };
        let Some(slot) = video.frames.get_mut(&token) else {
            tracing::trace!(token, "display of unknown frame");
            return;
        };
        if slot.displayed {
            return;
        }

        slot.displayed = true;
        let buffer = slot.buffer.take();
        if slot.unlocked {
            video.frames.remove(&token);
        }

        if video.last_displayed == Some(info.time) {
            Counters::bump(&self.counters.duplicate_frames);
            tracing::trace!(time = ?info.time, "duplicate frame");
            return;
        }
        video.last_displayed = Some(info.time);
        drop(video);

        let Some(buffer) = buffer else {
            return;
        };

        let mut sample = TextureSample::new(
            buffer,
            format.buffer_dim,
            format.output_dim,
            format.format,
            format.stride,
            format.frame_duration,
        );
        sample.set_time(info.time, info.timecode());
        let sample = Arc::new(sample);

        if let Some(sink) = self.video_sink() {
            sink.on_texture_sample(sample);
        } else if self.deliver_to_queues() {
            self.samples.add_video(sample);
        } else {
            return;
        }
        Counters::bump(&self.counters.video_frames);
    }
}

fn same_sink<T: ?Sized>(current: &Option<Weak<T>>, new: &Option<Weak<T>>) -> bool {
    match (current, new) {
        (None, None) => true,
        (Some(current), Some(new)) => Weak::ptr_eq(current, new),
        _ => false,
    }
}

fn offset_by_micros(time: Duration, micros: i64) -> Duration {
    let delta = Duration::from_micros(micros.unsigned_abs());
    if micros >= 0 {
        time.saturating_add(delta)
    } else {
        time.saturating_sub(delta)
    }
}

/// Frees a buffer handed out by [`CallbackBridge::video_lock`] with a null picture
fn release_throwaway(plane: *mut c_void) {
    if !plane.is_null() {
        // SAFETY: throwaway planes come from libc::malloc and are released once
        unsafe { libc::free(plane) };
    }
}

// ──────────────────── C-ABI trampolines ────────────────────

/// Recovers the bridge from a registered context pointer
unsafe fn bridge_from<'a>(opaque: *mut c_void) -> Option<&'a CallbackBridge> {
    unsafe { (opaque as *const CallbackBridge).as_ref() }
}

pub(crate) unsafe extern "C" fn handle_audio_setup(
    data: *mut *mut c_void,
    format: *mut c_char,
    rate: *mut c_uint,
    channels: *mut c_uint,
) -> c_int {
    let result = panic::catch_unwind(|| {
        if data.is_null() || format.is_null() || rate.is_null() || channels.is_null() {
            return -1;
        }
        let Some(bridge) = (unsafe { bridge_from(*data) }) else {
            return -1;
        };

        let tag = unsafe { &mut *(format as *mut [u8; 4]) };
        let mut code = FourCc::new(*tag);
        let (rate, channels) = unsafe { (&mut *rate, &mut *channels) };

        if !bridge.audio_setup(&mut code, rate, channels) {
            return -1;
        }
        *tag = *code.as_bytes();
        0
    });

    result.unwrap_or(-1)
}

pub(crate) unsafe extern "C" fn handle_audio_cleanup(data: *mut c_void) {
    let _ = panic::catch_unwind(|| {
        if let Some(bridge) = unsafe { bridge_from(data) } {
            bridge.audio_cleanup();
        }
    });
}

pub(crate) unsafe extern "C" fn handle_audio_play(
    data: *mut c_void,
    samples: *const c_void,
    count: c_uint,
    pts: i64,
) {
    let _ = panic::catch_unwind(|| {
        let Some(bridge) = (unsafe { bridge_from(data) }) else {
            return;
        };
        let Some(size) = bridge.audio_buffer_size(count) else {
            return;
        };

        let block: &[u8] = if size == 0 {
            &[]
        } else if samples.is_null() {
            return;
        } else {
            unsafe { slice::from_raw_parts(samples as *const u8, size) }
        };
        bridge.audio_play(block, count, pts);
    });
}

pub(crate) unsafe extern "C" fn handle_audio_pause(data: *mut c_void, _pts: i64) {
    let _ = panic::catch_unwind(|| {
        if let Some(bridge) = unsafe { bridge_from(data) } {
            bridge.audio_pause();
        }
    });
}

pub(crate) unsafe extern "C" fn handle_audio_resume(data: *mut c_void, _pts: i64) {
    let _ = panic::catch_unwind(|| {
        if let Some(bridge) = unsafe { bridge_from(data) } {
            bridge.audio_resume();
        }
    });
}

pub(crate) unsafe extern "C" fn handle_audio_flush(data: *mut c_void, _pts: i64) {
    let _ = panic::catch_unwind(|| {
        if let Some(bridge) = unsafe { bridge_from(data) } {
            bridge.audio_flush();
        }
    });
}

pub(crate) unsafe extern "C" fn handle_audio_drain(data: *mut c_void) {
    let _ = panic::catch_unwind(|| {
        if let Some(bridge) = unsafe { bridge_from(data) } {
            bridge.audio_drain();
        }
    });
}

pub(crate) unsafe extern "C" fn handle_video_setup(
    opaque: *mut *mut c_void,
    chroma: *mut c_char,
    width: *mut c_uint,
    height: *mut c_uint,
    pitches: *mut c_uint,
    lines: *mut c_uint,
) -> c_uint {
    let result = panic::catch_unwind(|| {
        if opaque.is_null()
            || chroma.is_null()
            || width.is_null()
            || height.is_null()
            || pitches.is_null()
            || lines.is_null()
        {
            return 0;
        }
        let Some(bridge) = (unsafe { bridge_from(*opaque) }) else {
            return 0;
        };

        let tag = unsafe { &mut *(chroma as *mut [u8; 4]) };
        let mut code = FourCc::new(*tag);
        let (width, height) = unsafe { (&mut *width, &mut *height) };
        let (pitch, lines) = unsafe { (&mut *pitches, &mut *lines) };

        if !bridge.video_setup(&mut code, width, height, pitch, lines) {
            return 0;
        }
        *tag = *code.as_bytes();
        1
    });

    result.unwrap_or(0)
}

pub(crate) unsafe extern "C" fn handle_video_cleanup(opaque: *mut c_void) {
    let _ = panic::catch_unwind(|| {
        if let Some(bridge) = unsafe { bridge_from(opaque) } {
            bridge.video_cleanup();
        }
    });
}

pub(crate) unsafe extern "C" fn handle_video_lock(
    opaque: *mut c_void,
    planes: *mut *mut c_void,
) -> *mut c_void {
    let result = panic::catch_unwind(|| {
        if planes.is_null() {
            return ptr::null_mut();
        }
        let Some(bridge) = (unsafe { bridge_from(opaque) }) else {
            return ptr::null_mut();
        };

        let frame = bridge.video_lock();
        unsafe {
            *planes = frame.plane;
            for index in 1..PICTURE_PLANE_MAX {
                *planes.add(index) = ptr::null_mut();
            }
        }
        frame.picture
    });

    result.unwrap_or(ptr::null_mut())
}

pub(crate) unsafe extern "C" fn handle_video_unlock(
    opaque: *mut c_void,
    picture: *mut c_void,
    planes: *const *mut c_void,
) {
    let _ = panic::catch_unwind(|| {
        if picture.is_null() {
            if !planes.is_null() {
                release_throwaway(unsafe { *planes });
            }
            return;
        }
        if let Some(bridge) = unsafe { bridge_from(opaque) } {
            bridge.video_unlock(picture as usize);
        }
    });
}

pub(crate) unsafe extern "C" fn handle_video_display(opaque: *mut c_void, picture: *mut c_void) {
    let _ = panic::catch_unwind(|| {
        if picture.is_null() {
            return;
        }
        if let Some(bridge) = unsafe { bridge_from(opaque) } {
            bridge.video_display(picture as usize);
        }
    });
}
