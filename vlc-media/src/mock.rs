//! Recording native engine for tests
//!
//! Stores every registered C callback and invokes it through its raw
//! signature, the way the native decode and event threads do.

use crate::native::*;
use crate::vlc_bindings::{libvlc_event_t, PICTURE_PLANE_MAX};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::os::raw::{c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use vlc_media_core::{FourCc, TrackKind};

#[derive(Default)]
struct Shared {
    clock: AtomicI64,
    fail_media: AtomicBool,
    fail_player: AtomicBool,
    fail_attach: AtomicBool,
    media: Mutex<Weak<MockMedia>>,
    player: Mutex<Weak<MockPlayer>>,
}

pub(crate) struct MockEngine {
    shared: Arc<Shared>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::new(Shared::default()),
        })
    }

    pub fn set_clock(&self, micros: i64) {
        self.shared.clock.store(micros, Ordering::Relaxed);
    }

    pub fn fail_media(&self, fail: bool) {
        self.shared.fail_media.store(fail, Ordering::Relaxed);
    }

    pub fn fail_player(&self, fail: bool) {
        self.shared.fail_player.store(fail, Ordering::Relaxed);
    }

    pub fn fail_attach(&self, fail: bool) {
        self.shared.fail_attach.store(fail, Ordering::Relaxed);
    }

    /// The most recently opened media, if still alive
    pub fn media(&self) -> Option<Arc<MockMedia>> {
        self.shared.media.lock().upgrade()
    }

    /// The most recently created player, if still alive
    pub fn player(&self) -> Option<Arc<MockPlayer>> {
        self.shared.player.lock().upgrade()
    }

    fn open(&self, source: MockSource) -> Result<Box<dyn NativeMedia>> {
        if self.shared.fail_media.load(Ordering::Relaxed) {
            return Err(Error::Native("media allocation failed".to_string()));
        }

        let media = Arc::new(MockMedia {
            source,
            events: Mutex::new(Vec::new()),
            meta: Mutex::new(HashMap::new()),
            shared: Arc::clone(&self.shared),
        });
        *self.shared.media.lock() = Arc::downgrade(&media);
        Ok(Box::new(MediaHandle(media)))
    }
}

impl NativeEngine for MockEngine {
    fn media_from_location(&self, url: &str) -> Result<Box<dyn NativeMedia>> {
        self.open(MockSource::Location(url.to_string()))
    }

    fn media_from_path(&self, path: &Path) -> Result<Box<dyn NativeMedia>> {
        self.open(MockSource::Path(path.to_path_buf()))
    }

    fn media_from_callbacks(&self, callbacks: StreamCallbacks) -> Result<Box<dyn NativeMedia>> {
        self.open(MockSource::Callbacks(callbacks))
    }

    fn clock(&self) -> i64 {
        self.shared.clock.load(Ordering::Relaxed)
    }

    fn chroma_plane_count(&self, chroma: FourCc) -> Option<u32> {
        match chroma.as_bytes() {
            b"I420" | b"YV12" | b"NV12" => Some(3),
            b"RV24" | b"RV16" => Some(1),
            _ => None,
        }
    }

    fn version(&self) -> String {
        "mock".to_string()
    }
}

pub(crate) enum MockSource {
    Location(String),
    Path(PathBuf),
    Callbacks(StreamCallbacks),
}

fn fire(handlers: &Mutex<Vec<(EngineEvent, EventHandler)>>, event: EngineEvent) {
    let handlers: Vec<EventHandler> = handlers
        .lock()
        .iter()
        .filter(|(attached, _)| *attached == event)
        .map(|(_, handler)| *handler)
        .collect();

    let raw = libvlc_event_t {
        type_: event.to_raw(),
        p_obj: ptr::null_mut(),
        u: [0; 4],
    };
    for handler in handlers {
        unsafe { (handler.callback)(&raw, handler.user_data) };
    }
}

pub(crate) struct MockMedia {
    pub source: MockSource,
    events: Mutex<Vec<(EngineEvent, EventHandler)>>,
    meta: Mutex<HashMap<&'static str, String>>,
    shared: Arc<Shared>,
}

impl MockMedia {
    pub fn fire(&self, event: EngineEvent) {
        fire(&self.events, event);
    }

    pub fn attached_events(&self) -> usize {
        self.events.lock().len()
    }

    pub fn set_meta(&self, key: MetaKey, value: &str) {
        self.meta.lock().insert(key.name(), value.to_string());
    }

    /// Reads the whole stream through the registered byte-stream callbacks
    pub fn read_stream(&self, chunk: usize) -> Option<Vec<u8>> {
        let MockSource::Callbacks(callbacks) = &self.source else {
            return None;
        };

        let mut data: *mut c_void = ptr::null_mut();
        let mut size = 0u64;
        let mut out = Vec::new();
        unsafe {
            if (callbacks.open)(callbacks.opaque, &mut data, &mut size) != 0 {
                return None;
            }
            let mut buf = vec![0u8; chunk];
            loop {
                let read = (callbacks.read)(data, buf.as_mut_ptr(), buf.len());
                if read <= 0 {
                    break;
                }
                out.extend_from_slice(&buf[..read as usize]);
            }
            if let Some(close) = callbacks.close {
                close(data);
            }
        }
        assert_eq!(out.len() as u64, size);
        Some(out)
    }

    /// Seeks the byte stream, returning the native status code
    pub fn seek_stream(&self, offset: u64) -> i32 {
        let MockSource::Callbacks(callbacks) = &self.source else {
            return -1;
        };
        match callbacks.seek {
            Some(seek) => unsafe { seek(callbacks.opaque, offset) },
            None => -1,
        }
    }
}

struct MediaHandle(Arc<MockMedia>);

impl NativeMedia for MediaHandle {
    fn create_player(&self) -> Result<Arc<dyn NativePlayer>> {
        let shared = &self.0.shared;
        if shared.fail_player.load(Ordering::Relaxed) {
            return Err(Error::Native("player allocation failed".to_string()));
        }

        let player = MockPlayer::new();
        player
            .fail_attach
            .store(shared.fail_attach.load(Ordering::Relaxed), Ordering::Relaxed);
        *shared.player.lock() = Arc::downgrade(&player);
        Ok(player)
    }

    fn attach_event(&self, event: EngineEvent, handler: EventHandler) -> Result<()> {
        self.0.events.lock().push((event, handler));
        Ok(())
    }

    fn detach_event(&self, event: EngineEvent, handler: EventHandler) {
        self.0.events.lock().retain(|(attached, existing)| {
            !(*attached == event && existing.user_data == handler.user_data)
        });
    }

    fn duration_ms(&self) -> i64 {
        90_000
    }

    fn meta(&self, key: MetaKey) -> Option<String> {
        self.0.meta.lock().get(key.name()).cloned()
    }

    fn stats(&self) -> Option<MediaStats> {
        Some(MediaStats {
            decoded_video: 12,
            displayed_pictures: 11,
            lost_pictures: 1,
            ..Default::default()
        })
    }
}

pub(crate) struct MockPlayerState {
    pub state: NativeState,
    pub rate: f32,
    pub time_ms: i64,
    pub length_ms: i64,
    pub seekable: bool,
    pub can_pause: bool,
    pub fail_play: bool,
    pub fail_rate: bool,
    pub fps: f32,
    pub video_size: Option<(u32, u32)>,
    pub tracks: HashMap<TrackKind, Vec<TrackDescription>>,
    pub selected: HashMap<TrackKind, i32>,
    pub audio_format: Option<(FourCc, u32, u32)>,
    pub video_format: Option<(FourCc, u32, u32, u32)>,
}

#[derive(Default)]
struct Registrations {
    audio: Option<AudioCallbacks>,
    audio_format: Option<AudioFormatCallbacks>,
    video: Option<VideoCallbacks>,
    video_format: Option<VideoFormatCallbacks>,
    frame_size: usize,
    /// Callbacks captured by outputs that completed setup; they stay in use
    /// after unregistration until the player stops
    running_audio: Option<AudioCallbacks>,
    running_video: Option<VideoCallbacks>,
}

impl Registrations {
    fn audio_output(&self) -> Option<AudioCallbacks> {
        self.running_audio.or(self.audio)
    }

    fn video_output(&self) -> Option<VideoCallbacks> {
        self.running_video.or(self.video)
    }
}

pub(crate) struct MockPlayer {
    pub state: Mutex<MockPlayerState>,
    calls: Mutex<Vec<String>>,
    events: Mutex<Vec<(EngineEvent, EventHandler)>>,
    registrations: Mutex<Registrations>,
    fail_attach: AtomicBool,
    on_stop: Mutex<Option<StopHook>>,
}

/// Decode-thread work that runs while the player stops its outputs
type StopHook = Box<dyn FnOnce(&MockPlayer) + Send>;

fn track(id: i32, name: &str) -> TrackDescription {
    TrackDescription {
        id,
        name: name.to_string(),
    }
}

impl MockPlayer {
    pub fn new() -> Arc<Self> {
        let tracks = HashMap::from([
            (
                TrackKind::Audio,
                vec![track(-1, "Disable"), track(1, "Track 1 - [English]"), track(2, "")],
            ),
            (TrackKind::Video, vec![track(-1, "Disable"), track(0, "Track 1")]),
            (TrackKind::Caption, vec![track(-1, "Disable"), track(3, "Track 1 - [Deutsch]")]),
        ]);
        let selected = HashMap::from([
            (TrackKind::Audio, 1),
            (TrackKind::Video, 0),
            (TrackKind::Caption, -1),
        ]);

        Arc::new(Self {
            state: Mutex::new(MockPlayerState {
                state: NativeState::NothingSpecial,
                rate: 1.0,
                time_ms: 0,
                length_ms: 90_000,
                seekable: true,
                can_pause: true,
                fail_play: false,
                fail_rate: false,
                fps: 25.0,
                video_size: Some((640, 360)),
                tracks,
                selected,
                audio_format: None,
                video_format: None,
            }),
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            registrations: Mutex::new(Registrations::default()),
            fail_attach: AtomicBool::new(false),
            on_stop: Mutex::new(None),
        })
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls.lock().iter().any(|recorded| recorded == call)
    }

    pub fn set_state(&self, state: NativeState) {
        self.state.lock().state = state;
    }

    pub fn set_time_ms(&self, time_ms: i64) {
        self.state.lock().time_ms = time_ms;
    }

    pub fn set_video_size(&self, size: Option<(u32, u32)>) {
        self.state.lock().video_size = size;
    }

    pub fn fire(&self, event: EngineEvent) {
        fire(&self.events, event);
    }

    pub fn attached_events(&self) -> usize {
        self.events.lock().len()
    }

    pub fn has_audio_callbacks(&self) -> bool {
        let registrations = self.registrations.lock();
        registrations.audio.is_some() && registrations.audio_format.is_some()
    }

    pub fn has_video_callbacks(&self) -> bool {
        let registrations = self.registrations.lock();
        registrations.video.is_some() && registrations.video_format.is_some()
    }

    /// Runs `hook` inside the next `stop`, before the started outputs shut down
    pub fn on_stop(&self, hook: impl FnOnce(&MockPlayer) + Send + 'static) {
        *self.on_stop.lock() = Some(Box::new(hook));
    }

    /// Bytes the decoder writes per frame, as negotiated by the last video setup
    pub fn frame_size(&self) -> usize {
        self.registrations.lock().frame_size
    }

    // ── Decode thread simulation ──

    /// Runs the audio setup callback; returns the rewritten format or `None` on failure
    pub fn audio_setup(&self, format: &str, rate: u32, channels: u32) -> Option<(FourCc, u32, u32)> {
        let (setup, audio) = {
            let registrations = self.registrations.lock();
            (registrations.audio_format?.setup, registrations.audio?)
        };
        let mut opaque = audio.opaque;

        let mut tag = *format.parse::<FourCc>().ok()?.as_bytes();
        let (mut rate, mut channels) = (rate, channels);
        let status = unsafe {
            setup(
                &mut opaque,
                tag.as_mut_ptr() as *mut c_char,
                &mut rate,
                &mut channels,
            )
        };

        if status != 0 {
            return None;
        }
        self.registrations.lock().running_audio = Some(audio);
        Some((FourCc::new(tag), rate, channels))
    }

    pub fn audio_cleanup(&self) {
        let registrations = self.registrations.lock();
        let (Some(format), Some(audio)) = (registrations.audio_format, registrations.audio) else {
            return;
        };
        drop(registrations);

        if let Some(cleanup) = format.cleanup {
            unsafe { cleanup(audio.opaque) };
        }
    }

    pub fn audio_play(&self, data: &[u8], count: u32, pts: i64) {
        let Some(audio) = self.registrations.lock().audio_output() else {
            return;
        };
        unsafe { (audio.play)(audio.opaque, data.as_ptr() as *const c_void, count, pts) };
    }

    pub fn audio_flush(&self) {
        let Some(audio) = self.registrations.lock().audio_output() else {
            return;
        };
        if let Some(flush) = audio.flush {
            unsafe { flush(audio.opaque, 0) };
        }
    }

    /// Runs the video setup callback; returns `(chroma, width, height, pitch, lines)`
    pub fn video_setup(&self, chroma: &str, width: u32, height: u32) -> Option<(FourCc, u32, u32, u32, u32)> {
        let (setup, video) = {
            let registrations = self.registrations.lock();
            (registrations.video_format?.setup, registrations.video?)
        };
        let mut opaque = video.opaque;

        let mut tag = *chroma.parse::<FourCc>().ok()?.as_bytes();
        let (mut width, mut height) = (width, height);
        let mut pitches = [0u32; PICTURE_PLANE_MAX];
        let mut lines = [0u32; PICTURE_PLANE_MAX];
        let buffers = unsafe {
            setup(
                &mut opaque,
                tag.as_mut_ptr() as *mut c_char,
                &mut width,
                &mut height,
                pitches.as_mut_ptr(),
                lines.as_mut_ptr(),
            )
        };
        if buffers == 0 {
            return None;
        }

        let mut registrations = self.registrations.lock();
        registrations.frame_size = pitches[0] as usize * lines[0] as usize;
        registrations.running_video = Some(video);
        drop(registrations);
        Some((FourCc::new(tag), width, height, pitches[0], lines[0]))
    }

    pub fn video_lock(&self) -> (*mut c_void, [*mut c_void; PICTURE_PLANE_MAX]) {
        let Some(video) = self.registrations.lock().video_output() else {
            return (ptr::null_mut(), [ptr::null_mut(); PICTURE_PLANE_MAX]);
        };
        // garbage in the unused planes, the bridge must clear them
        let mut planes = [1usize as *mut c_void; PICTURE_PLANE_MAX];
        let picture = unsafe { (video.lock)(video.opaque, planes.as_mut_ptr()) };
        (picture, planes)
    }

    pub fn video_unlock(&self, picture: *mut c_void, planes: &[*mut c_void; PICTURE_PLANE_MAX]) {
        let Some(video) = self.registrations.lock().video_output() else {
            return;
        };
        if let Some(unlock) = video.unlock {
            unsafe { unlock(video.opaque, picture, planes.as_ptr()) };
        }
    }

    pub fn video_display(&self, picture: *mut c_void) {
        let Some(video) = self.registrations.lock().video_output() else {
            return;
        };
        if let Some(display) = video.display {
            unsafe { display(video.opaque, picture) };
        }
    }

    /// Decodes one frame filled with `fill`: lock, write, unlock, display
    pub fn video_frame(&self, fill: u8) {
        let size = self.registrations.lock().frame_size;
        let (picture, planes) = self.video_lock();
        if !planes[0].is_null() {
            unsafe { ptr::write_bytes(planes[0] as *mut u8, fill, size) };
        }
        self.video_unlock(picture, &planes);
        self.video_display(picture);
    }
}

impl NativePlayer for MockPlayer {
    fn attach_event(&self, event: EngineEvent, handler: EventHandler) -> Result<()> {
        if self.fail_attach.load(Ordering::Relaxed) {
            return Err(Error::Native("event attach failed".to_string()));
        }
        self.events.lock().push((event, handler));
        Ok(())
    }

    fn detach_event(&self, event: EngineEvent, handler: EventHandler) {
        self.events.lock().retain(|(attached, existing)| {
            !(*attached == event && existing.user_data == handler.user_data)
        });
    }

    fn play(&self) -> Result<()> {
        self.record("play");
        let mut state = self.state.lock();
        if state.fail_play {
            return Err(Error::Native("play failed".to_string()));
        }
        state.state = NativeState::Playing;
        Ok(())
    }

    fn set_pause(&self, pause: bool) {
        self.record(if pause { "pause" } else { "unpause" });
        let mut state = self.state.lock();
        state.state = if pause {
            NativeState::Paused
        } else {
            NativeState::Playing
        };
    }

    fn stop(&self) {
        self.record("stop");
        let hook = self.on_stop.lock().take();
        if let Some(hook) = hook {
            hook(self);
        }

        let mut registrations = self.registrations.lock();
        registrations.running_audio = None;
        registrations.running_video = None;
        drop(registrations);
        self.state.lock().state = NativeState::Stopped;
    }

    fn set_rate(&self, rate: f32) -> Result<()> {
        self.record("set_rate");
        let mut state = self.state.lock();
        if state.fail_rate {
            return Err(Error::Native("rate rejected".to_string()));
        }
        state.rate = rate;
        Ok(())
    }

    fn rate(&self) -> f32 {
        self.state.lock().rate
    }

    fn set_time(&self, time_ms: i64) {
        self.record("set_time");
        self.state.lock().time_ms = time_ms;
    }

    fn time(&self) -> i64 {
        self.state.lock().time_ms
    }

    fn length(&self) -> i64 {
        self.state.lock().length_ms
    }

    fn state(&self) -> NativeState {
        self.state.lock().state
    }

    fn is_seekable(&self) -> bool {
        self.state.lock().seekable
    }

    fn can_pause(&self) -> bool {
        self.state.lock().can_pause
    }

    fn fps(&self) -> f32 {
        self.state.lock().fps
    }

    fn video_size(&self, _index: u32) -> Option<(u32, u32)> {
        self.state.lock().video_size
    }

    fn track_descriptions(&self, kind: TrackKind) -> Vec<TrackDescription> {
        self.state.lock().tracks.get(&kind).cloned().unwrap_or_default()
    }

    fn selected_track(&self, kind: TrackKind) -> i32 {
        self.state.lock().selected.get(&kind).copied().unwrap_or(-1)
    }

    fn select_track(&self, kind: TrackKind, id: i32) -> Result<()> {
        self.record("select_track");
        self.state.lock().selected.insert(kind, id);
        Ok(())
    }

    fn set_audio_callbacks(&self, callbacks: Option<AudioCallbacks>) {
        self.registrations.lock().audio = callbacks;
    }

    fn set_audio_format_callbacks(&self, callbacks: Option<AudioFormatCallbacks>) {
        self.registrations.lock().audio_format = callbacks;
    }

    fn set_audio_format(&self, format: FourCc, rate: u32, channels: u32) {
        // a fixed format replaces the format callbacks
        self.registrations.lock().audio_format = None;
        self.state.lock().audio_format = Some((format, rate, channels));
    }

    fn set_video_callbacks(&self, callbacks: Option<VideoCallbacks>) {
        self.registrations.lock().video = callbacks;
    }

    fn set_video_format_callbacks(&self, callbacks: Option<VideoFormatCallbacks>) {
        self.registrations.lock().video_format = callbacks;
    }

    fn set_video_format(&self, chroma: FourCc, width: u32, height: u32, pitch: u32) {
        self.registrations.lock().video_format = None;
        self.state.lock().video_format = Some((chroma, width, height, pitch));
    }
}
