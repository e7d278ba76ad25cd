//! LibVLC implementation of the native boundary
//!
//! Thin safe wrappers over the raw bindings. Every handle is released in
//! `Drop`; LibVLC reference-counts internally, so a media player keeps its
//! media and a media keeps its instance alive on the native side.

use crate::native::*;
use crate::vlc_bindings::*;
use crate::{Error, Result};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use vlc_media_core::{FourCc, TrackKind};

/// LibVLC's last error message, or `context` if it has none
fn last_error(context: &str) -> Error {
    let message = unsafe { libvlc_errmsg() };
    if message.is_null() {
        return Error::Native(context.to_string());
    }
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    Error::Native(format!("{context}: {message}"))
}

fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|e| Error::Native(format!("invalid string for libvlc: {e}")))
}

/// NUL-terminated four-character code
fn fourcc_string(code: FourCc) -> [c_char; 5] {
    let bytes = code.as_bytes();
    [
        bytes[0] as c_char,
        bytes[1] as c_char,
        bytes[2] as c_char,
        bytes[3] as c_char,
        0,
    ]
}

fn status(result: c_int, context: &str) -> Result<()> {
    if result == LIBVLC_SUCCESS {
        Ok(())
    } else {
        Err(last_error(context))
    }
}

// ──────────────────── Engine ────────────────────

/// A LibVLC instance
pub struct LibVlcEngine {
    instance: NonNull<libvlc_instance_t>,
}

// SAFETY: libvlc instances are thread-safe and only released in Drop
unsafe impl Send for LibVlcEngine {}
unsafe impl Sync for LibVlcEngine {}

impl LibVlcEngine {
    /// Creates an instance with the given startup arguments
    pub fn new(args: &[String]) -> Result<Self> {
        let args = args
            .iter()
            .map(|arg| c_string(arg))
            .collect::<Result<Vec<_>>>()?;
        let argv: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();

        tracing::debug!(?args, "starting libvlc");
        let instance = unsafe { libvlc_new(argv.len() as c_int, argv.as_ptr()) };
        let instance =
            NonNull::new(instance).ok_or_else(|| last_error("failed to create libvlc instance"))?;

        Ok(Self { instance })
    }

    fn wrap_media(&self, media: *mut libvlc_media_t, context: &str) -> Result<Box<dyn NativeMedia>> {
        let media = NonNull::new(media).ok_or_else(|| last_error(context))?;
        Ok(Box::new(LibVlcMedia { media }))
    }
}

impl Drop for LibVlcEngine {
    fn drop(&mut self) {
        unsafe { libvlc_release(self.instance.as_ptr()) };
        tracing::debug!("libvlc instance released");
    }
}

impl NativeEngine for LibVlcEngine {
    fn media_from_location(&self, url: &str) -> Result<Box<dyn NativeMedia>> {
        let location = c_string(url)?;
        let media = unsafe { libvlc_media_new_location(self.instance.as_ptr(), location.as_ptr()) };
        self.wrap_media(media, "failed to open media location")
    }

    fn media_from_path(&self, path: &Path) -> Result<Box<dyn NativeMedia>> {
        let path = c_string(&path.to_string_lossy())?;
        let media = unsafe { libvlc_media_new_path(self.instance.as_ptr(), path.as_ptr()) };
        self.wrap_media(media, "failed to open media path")
    }

    fn media_from_callbacks(&self, callbacks: StreamCallbacks) -> Result<Box<dyn NativeMedia>> {
        let media = unsafe {
            libvlc_media_new_callbacks(
                self.instance.as_ptr(),
                Some(callbacks.open),
                Some(callbacks.read),
                callbacks.seek,
                callbacks.close,
                callbacks.opaque,
            )
        };
        self.wrap_media(media, "failed to open media stream")
    }

    fn clock(&self) -> i64 {
        unsafe { libvlc_clock() }
    }

    fn chroma_plane_count(&self, chroma: FourCc) -> Option<u32> {
        let description = unsafe { vlc_fourcc_GetChromaDescription(chroma.to_u32()) };
        let description = unsafe { description.as_ref() }?;
        Some(description.plane_count)
    }

    fn version(&self) -> String {
        let version = unsafe { libvlc_get_version() };
        if version.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(version) }.to_string_lossy().into_owned()
    }
}

// ──────────────────── Media ────────────────────

pub struct LibVlcMedia {
    media: NonNull<libvlc_media_t>,
}

// SAFETY: libvlc media objects are reference-counted and internally locked
unsafe impl Send for LibVlcMedia {}

impl LibVlcMedia {
    fn event_manager(&self) -> Result<*mut libvlc_event_manager_t> {
        let manager = unsafe { libvlc_media_event_manager(self.media.as_ptr()) };
        if manager.is_null() {
            return Err(last_error("media has no event manager"));
        }
        Ok(manager)
    }
}

impl Drop for LibVlcMedia {
    fn drop(&mut self) {
        unsafe { libvlc_media_release(self.media.as_ptr()) };
    }
}

impl NativeMedia for LibVlcMedia {
    fn create_player(&self) -> Result<Arc<dyn NativePlayer>> {
        let player = unsafe { libvlc_media_player_new_from_media(self.media.as_ptr()) };
        let player =
            NonNull::new(player).ok_or_else(|| last_error("failed to create media player"))?;
        Ok(Arc::new(LibVlcPlayer { player }))
    }

    fn attach_event(&self, event: EngineEvent, handler: EventHandler) -> Result<()> {
        let manager = self.event_manager()?;
        let result = unsafe {
            libvlc_event_attach(manager, event.to_raw(), handler.callback, handler.user_data)
        };
        status(result, "failed to attach media event")
    }

    fn detach_event(&self, event: EngineEvent, handler: EventHandler) {
        if let Ok(manager) = self.event_manager() {
            unsafe {
                libvlc_event_detach(manager, event.to_raw(), handler.callback, handler.user_data)
            };
        }
    }

    fn duration_ms(&self) -> i64 {
        unsafe { libvlc_media_get_duration(self.media.as_ptr()) }
    }

    fn meta(&self, key: MetaKey) -> Option<String> {
        let value = unsafe { libvlc_media_get_meta(self.media.as_ptr(), key.to_raw()) };
        if value.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned();
        unsafe { libvlc_free(value as *mut c_void) };
        Some(text)
    }

    fn stats(&self) -> Option<MediaStats> {
        let mut stats = libvlc_media_stats_t::default();
        let ok = unsafe { libvlc_media_get_stats(self.media.as_ptr(), &mut stats) };
        (ok != 0).then(|| stats.into())
    }
}

// ──────────────────── Player ────────────────────

pub struct LibVlcPlayer {
    player: NonNull<libvlc_media_player_t>,
}

// SAFETY: libvlc media player calls are internally synchronized
unsafe impl Send for LibVlcPlayer {}
unsafe impl Sync for LibVlcPlayer {}

impl LibVlcPlayer {
    fn raw(&self) -> *mut libvlc_media_player_t {
        self.player.as_ptr()
    }

    fn event_manager(&self) -> Result<*mut libvlc_event_manager_t> {
        let manager = unsafe { libvlc_media_player_event_manager(self.raw()) };
        if manager.is_null() {
            return Err(last_error("player has no event manager"));
        }
        Ok(manager)
    }
}

impl Drop for LibVlcPlayer {
    fn drop(&mut self) {
        unsafe { libvlc_media_player_release(self.raw()) };
    }
}

/// Copies and releases a native track description list
unsafe fn collect_tracks(head: *mut libvlc_track_description_t) -> Vec<TrackDescription> {
    let mut tracks = Vec::new();
    let mut node = head;
    while let Some(current) = unsafe { node.as_ref() } {
        let name = if current.psz_name.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(current.psz_name) }
                .to_string_lossy()
                .into_owned()
        };
        tracks.push(TrackDescription {
            id: current.i_id,
            name,
        });
        node = current.p_next;
    }

    if !head.is_null() {
        unsafe { libvlc_track_description_list_release(head) };
    }
    tracks
}

impl NativePlayer for LibVlcPlayer {
    fn attach_event(&self, event: EngineEvent, handler: EventHandler) -> Result<()> {
        let manager = self.event_manager()?;
        let result = unsafe {
            libvlc_event_attach(manager, event.to_raw(), handler.callback, handler.user_data)
        };
        status(result, "failed to attach player event")
    }

    fn detach_event(&self, event: EngineEvent, handler: EventHandler) {
        if let Ok(manager) = self.event_manager() {
            unsafe {
                libvlc_event_detach(manager, event.to_raw(), handler.callback, handler.user_data)
            };
        }
    }

    fn play(&self) -> Result<()> {
        status(unsafe { libvlc_media_player_play(self.raw()) }, "failed to play")
    }

    fn set_pause(&self, pause: bool) {
        unsafe { libvlc_media_player_set_pause(self.raw(), c_int::from(pause)) };
    }

    fn stop(&self) {
        unsafe { libvlc_media_player_stop(self.raw()) };
    }

    fn set_rate(&self, rate: f32) -> Result<()> {
        status(
            unsafe { libvlc_media_player_set_rate(self.raw(), rate) },
            "failed to set rate",
        )
    }

    fn rate(&self) -> f32 {
        unsafe { libvlc_media_player_get_rate(self.raw()) }
    }

    fn set_time(&self, time_ms: i64) {
        unsafe { libvlc_media_player_set_time(self.raw(), time_ms) };
    }

    fn time(&self) -> i64 {
        unsafe { libvlc_media_player_get_time(self.raw()) }
    }

    fn length(&self) -> i64 {
        unsafe { libvlc_media_player_get_length(self.raw()) }
    }

    fn state(&self) -> NativeState {
        NativeState::from_raw(unsafe { libvlc_media_player_get_state(self.raw()) })
    }

    fn is_seekable(&self) -> bool {
        unsafe { libvlc_media_player_is_seekable(self.raw()) != 0 }
    }

    fn can_pause(&self) -> bool {
        unsafe { libvlc_media_player_can_pause(self.raw()) != 0 }
    }

    fn fps(&self) -> f32 {
        unsafe { libvlc_media_player_get_fps(self.raw()) }
    }

    fn video_size(&self, index: u32) -> Option<(u32, u32)> {
        let (mut width, mut height): (c_uint, c_uint) = (0, 0);
        let result = unsafe { libvlc_video_get_size(self.raw(), index, &mut width, &mut height) };
        (result == 0 && width > 0 && height > 0).then_some((width, height))
    }

    fn track_descriptions(&self, kind: TrackKind) -> Vec<TrackDescription> {
        let head = unsafe {
            match kind {
                TrackKind::Audio => libvlc_audio_get_track_description(self.raw()),
                TrackKind::Caption => libvlc_video_get_spu_description(self.raw()),
                TrackKind::Video => libvlc_video_get_track_description(self.raw()),
            }
        };
        unsafe { collect_tracks(head) }
    }

    fn selected_track(&self, kind: TrackKind) -> i32 {
        unsafe {
            match kind {
                TrackKind::Audio => libvlc_audio_get_track(self.raw()),
                TrackKind::Caption => libvlc_video_get_spu(self.raw()),
                TrackKind::Video => libvlc_video_get_track(self.raw()),
            }
        }
    }

    fn select_track(&self, kind: TrackKind, id: i32) -> Result<()> {
        let result = unsafe {
            match kind {
                TrackKind::Audio => libvlc_audio_set_track(self.raw(), id),
                TrackKind::Caption => libvlc_video_set_spu(self.raw(), id),
                TrackKind::Video => libvlc_video_set_track(self.raw(), id),
            }
        };
        status(result, "failed to select track")
    }

    fn set_audio_callbacks(&self, callbacks: Option<AudioCallbacks>) {
        unsafe {
            match callbacks {
                Some(cb) => libvlc_audio_set_callbacks(
                    self.raw(),
                    Some(cb.play),
                    cb.pause,
                    cb.resume,
                    cb.flush,
                    cb.drain,
                    cb.opaque,
                ),
                None => libvlc_audio_set_callbacks(
                    self.raw(),
                    None,
                    None,
                    None,
                    None,
                    None,
                    ptr::null_mut(),
                ),
            }
        }
    }

    fn set_audio_format_callbacks(&self, callbacks: Option<AudioFormatCallbacks>) {
        let (setup, cleanup) = match callbacks {
            Some(cb) => (Some(cb.setup), cb.cleanup),
            None => (None, None),
        };
        unsafe { libvlc_audio_set_format_callbacks(self.raw(), setup, cleanup) };
    }

    fn set_audio_format(&self, format: FourCc, rate: u32, channels: u32) {
        let format = fourcc_string(format);
        unsafe { libvlc_audio_set_format(self.raw(), format.as_ptr(), rate, channels) };
    }

    fn set_video_callbacks(&self, callbacks: Option<VideoCallbacks>) {
        unsafe {
            match callbacks {
                Some(cb) => libvlc_video_set_callbacks(
                    self.raw(),
                    Some(cb.lock),
                    cb.unlock,
                    cb.display,
                    cb.opaque,
                ),
                None => libvlc_video_set_callbacks(self.raw(), None, None, None, ptr::null_mut()),
            }
        }
    }

    fn set_video_format_callbacks(&self, callbacks: Option<VideoFormatCallbacks>) {
        let (setup, cleanup) = match callbacks {
            Some(cb) => (Some(cb.setup), cb.cleanup),
            None => (None, None),
        };
        unsafe { libvlc_video_set_format_callbacks(self.raw(), setup, cleanup) };
    }

    fn set_video_format(&self, chroma: FourCc, width: u32, height: u32, pitch: u32) {
        let chroma = fourcc_string(chroma);
        unsafe { libvlc_video_set_format(self.raw(), chroma.as_ptr(), width, height, pitch) };
    }
}
