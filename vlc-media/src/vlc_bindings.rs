//! LibVLC C API Bindings
//!
//! Manual bindings for the subset of LibVLC 3.x the player uses.
//! Types and callback signatures are always available so the callback
//! trampolines can be registered and exercised; the functions themselves are
//! only declared when the `libvlc` feature links the native library.

#![allow(non_camel_case_types)]
#![allow(dead_code)]

use std::os::raw::{c_char, c_float, c_int, c_uchar, c_uint, c_void};

// Opaque types
pub enum libvlc_instance_t {}
pub enum libvlc_media_t {}
pub enum libvlc_media_player_t {}
pub enum libvlc_event_manager_t {}

// Return codes
pub const LIBVLC_SUCCESS: c_int = 0;
pub const LIBVLC_ERROR: c_int = -1;

/// Maximum number of picture planes the video callbacks expose
pub const PICTURE_PLANE_MAX: usize = 5;

// Media events
pub const LIBVLC_MEDIA_META_CHANGED: c_int = 0;
pub const LIBVLC_MEDIA_DURATION_CHANGED: c_int = 2;
pub const LIBVLC_MEDIA_PARSED_CHANGED: c_int = 3;

// Media player events
pub const LIBVLC_MEDIA_PLAYER_OPENING: c_int = 0x102;
pub const LIBVLC_MEDIA_PLAYER_BUFFERING: c_int = 0x103;
pub const LIBVLC_MEDIA_PLAYER_PLAYING: c_int = 0x104;
pub const LIBVLC_MEDIA_PLAYER_PAUSED: c_int = 0x105;
pub const LIBVLC_MEDIA_PLAYER_STOPPED: c_int = 0x106;
pub const LIBVLC_MEDIA_PLAYER_END_REACHED: c_int = 0x109;
pub const LIBVLC_MEDIA_PLAYER_ENCOUNTERED_ERROR: c_int = 0x10A;
pub const LIBVLC_MEDIA_PLAYER_TIME_CHANGED: c_int = 0x10B;
pub const LIBVLC_MEDIA_PLAYER_POSITION_CHANGED: c_int = 0x10C;

// libvlc_state_t
pub const LIBVLC_NOTHING_SPECIAL: c_int = 0;
pub const LIBVLC_OPENING: c_int = 1;
pub const LIBVLC_BUFFERING: c_int = 2;
pub const LIBVLC_PLAYING: c_int = 3;
pub const LIBVLC_PAUSED: c_int = 4;
pub const LIBVLC_STOPPED: c_int = 5;
pub const LIBVLC_ENDED: c_int = 6;
pub const LIBVLC_ERROR_STATE: c_int = 7;

// libvlc_meta_t
pub const LIBVLC_META_TITLE: c_int = 0;
pub const LIBVLC_META_ARTIST: c_int = 1;
pub const LIBVLC_META_GENRE: c_int = 2;
pub const LIBVLC_META_ALBUM: c_int = 4;
pub const LIBVLC_META_DESCRIPTION: c_int = 6;
pub const LIBVLC_META_DATE: c_int = 8;

/// Event delivered to event-manager callbacks.
///
/// Only the type is read; the union payload is never interpreted because no
/// pointer from it may outlive the callback.
#[repr(C)]
pub struct libvlc_event_t {
    pub type_: c_int,
    pub p_obj: *mut c_void,
    pub u: [u64; 4],
}

/// Node of a track description list
#[repr(C)]
pub struct libvlc_track_description_t {
    pub i_id: c_int,
    pub psz_name: *mut c_char,
    pub p_next: *mut libvlc_track_description_t,
}

/// Media statistics
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct libvlc_media_stats_t {
    pub i_read_bytes: c_int,
    pub f_input_bitrate: c_float,
    pub i_demux_read_bytes: c_int,
    pub f_demux_bitrate: c_float,
    pub i_demux_corrupted: c_int,
    pub i_demux_discontinuity: c_int,
    pub i_decoded_video: c_int,
    pub i_decoded_audio: c_int,
    pub i_displayed_pictures: c_int,
    pub i_lost_pictures: c_int,
    pub i_played_abuffers: c_int,
    pub i_lost_abuffers: c_int,
    pub i_sent_packets: c_int,
    pub i_sent_bytes: c_int,
    pub f_send_bitrate: c_float,
}

/// Leading fields of libvlccore's chroma description
#[repr(C)]
pub struct vlc_chroma_description_t {
    pub fourcc: u32,
    pub plane_count: c_uint,
    // ... plane geometry we don't need
}

// Event manager callback
pub type libvlc_callback_t = unsafe extern "C" fn(p_event: *const libvlc_event_t, p_data: *mut c_void);

// Audio callbacks
pub type libvlc_audio_play_cb =
    unsafe extern "C" fn(data: *mut c_void, samples: *const c_void, count: c_uint, pts: i64);
pub type libvlc_audio_pause_cb = unsafe extern "C" fn(data: *mut c_void, pts: i64);
pub type libvlc_audio_resume_cb = unsafe extern "C" fn(data: *mut c_void, pts: i64);
pub type libvlc_audio_flush_cb = unsafe extern "C" fn(data: *mut c_void, pts: i64);
pub type libvlc_audio_drain_cb = unsafe extern "C" fn(data: *mut c_void);
pub type libvlc_audio_setup_cb = unsafe extern "C" fn(
    data: *mut *mut c_void,
    format: *mut c_char,
    rate: *mut c_uint,
    channels: *mut c_uint,
) -> c_int;
pub type libvlc_audio_cleanup_cb = unsafe extern "C" fn(data: *mut c_void);

// Video callbacks
pub type libvlc_video_lock_cb =
    unsafe extern "C" fn(opaque: *mut c_void, planes: *mut *mut c_void) -> *mut c_void;
pub type libvlc_video_unlock_cb =
    unsafe extern "C" fn(opaque: *mut c_void, picture: *mut c_void, planes: *const *mut c_void);
pub type libvlc_video_display_cb = unsafe extern "C" fn(opaque: *mut c_void, picture: *mut c_void);
pub type libvlc_video_format_cb = unsafe extern "C" fn(
    opaque: *mut *mut c_void,
    chroma: *mut c_char,
    width: *mut c_uint,
    height: *mut c_uint,
    pitches: *mut c_uint,
    lines: *mut c_uint,
) -> c_uint;
pub type libvlc_video_cleanup_cb = unsafe extern "C" fn(opaque: *mut c_void);

// Custom media input callbacks
pub type libvlc_media_open_cb =
    unsafe extern "C" fn(opaque: *mut c_void, datap: *mut *mut c_void, sizep: *mut u64) -> c_int;
pub type libvlc_media_read_cb =
    unsafe extern "C" fn(opaque: *mut c_void, buf: *mut c_uchar, len: usize) -> isize;
pub type libvlc_media_seek_cb = unsafe extern "C" fn(opaque: *mut c_void, offset: u64) -> c_int;
pub type libvlc_media_close_cb = unsafe extern "C" fn(opaque: *mut c_void);

#[cfg(feature = "libvlc")]
extern "C" {
    // Instance
    pub fn libvlc_new(argc: c_int, argv: *const *const c_char) -> *mut libvlc_instance_t;
    pub fn libvlc_release(instance: *mut libvlc_instance_t);
    pub fn libvlc_errmsg() -> *const c_char;
    pub fn libvlc_get_version() -> *const c_char;
    pub fn libvlc_clock() -> i64;
    pub fn libvlc_free(ptr: *mut c_void);

    // Media
    pub fn libvlc_media_new_location(
        instance: *mut libvlc_instance_t,
        mrl: *const c_char,
    ) -> *mut libvlc_media_t;
    pub fn libvlc_media_new_path(
        instance: *mut libvlc_instance_t,
        path: *const c_char,
    ) -> *mut libvlc_media_t;
    pub fn libvlc_media_new_callbacks(
        instance: *mut libvlc_instance_t,
        open_cb: Option<libvlc_media_open_cb>,
        read_cb: Option<libvlc_media_read_cb>,
        seek_cb: Option<libvlc_media_seek_cb>,
        close_cb: Option<libvlc_media_close_cb>,
        opaque: *mut c_void,
    ) -> *mut libvlc_media_t;
    pub fn libvlc_media_release(media: *mut libvlc_media_t);
    pub fn libvlc_media_event_manager(media: *mut libvlc_media_t) -> *mut libvlc_event_manager_t;
    pub fn libvlc_media_get_duration(media: *mut libvlc_media_t) -> i64;
    pub fn libvlc_media_get_stats(
        media: *mut libvlc_media_t,
        stats: *mut libvlc_media_stats_t,
    ) -> c_int;
    pub fn libvlc_media_get_meta(media: *mut libvlc_media_t, meta: c_int) -> *mut c_char;

    // Events
    pub fn libvlc_event_attach(
        manager: *mut libvlc_event_manager_t,
        event_type: c_int,
        callback: libvlc_callback_t,
        user_data: *mut c_void,
    ) -> c_int;
    pub fn libvlc_event_detach(
        manager: *mut libvlc_event_manager_t,
        event_type: c_int,
        callback: libvlc_callback_t,
        user_data: *mut c_void,
    );

    // Media player
    pub fn libvlc_media_player_new_from_media(
        media: *mut libvlc_media_t,
    ) -> *mut libvlc_media_player_t;
    pub fn libvlc_media_player_release(player: *mut libvlc_media_player_t);
    pub fn libvlc_media_player_event_manager(
        player: *mut libvlc_media_player_t,
    ) -> *mut libvlc_event_manager_t;
    pub fn libvlc_media_player_play(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_media_player_set_pause(player: *mut libvlc_media_player_t, do_pause: c_int);
    pub fn libvlc_media_player_stop(player: *mut libvlc_media_player_t);
    pub fn libvlc_media_player_set_rate(player: *mut libvlc_media_player_t, rate: c_float) -> c_int;
    pub fn libvlc_media_player_get_rate(player: *mut libvlc_media_player_t) -> c_float;
    pub fn libvlc_media_player_set_time(player: *mut libvlc_media_player_t, time: i64);
    pub fn libvlc_media_player_get_time(player: *mut libvlc_media_player_t) -> i64;
    pub fn libvlc_media_player_get_length(player: *mut libvlc_media_player_t) -> i64;
    pub fn libvlc_media_player_get_state(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_media_player_is_seekable(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_media_player_can_pause(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_media_player_get_fps(player: *mut libvlc_media_player_t) -> c_float;

    // Tracks
    pub fn libvlc_audio_get_track_description(
        player: *mut libvlc_media_player_t,
    ) -> *mut libvlc_track_description_t;
    pub fn libvlc_video_get_track_description(
        player: *mut libvlc_media_player_t,
    ) -> *mut libvlc_track_description_t;
    pub fn libvlc_video_get_spu_description(
        player: *mut libvlc_media_player_t,
    ) -> *mut libvlc_track_description_t;
    pub fn libvlc_track_description_list_release(list: *mut libvlc_track_description_t);
    pub fn libvlc_audio_get_track(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_audio_set_track(player: *mut libvlc_media_player_t, track: c_int) -> c_int;
    pub fn libvlc_video_get_track(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_video_set_track(player: *mut libvlc_media_player_t, track: c_int) -> c_int;
    pub fn libvlc_video_get_spu(player: *mut libvlc_media_player_t) -> c_int;
    pub fn libvlc_video_set_spu(player: *mut libvlc_media_player_t, spu: c_int) -> c_int;

    // Audio output
    pub fn libvlc_audio_set_callbacks(
        player: *mut libvlc_media_player_t,
        play: Option<libvlc_audio_play_cb>,
        pause: Option<libvlc_audio_pause_cb>,
        resume: Option<libvlc_audio_resume_cb>,
        flush: Option<libvlc_audio_flush_cb>,
        drain: Option<libvlc_audio_drain_cb>,
        opaque: *mut c_void,
    );
    pub fn libvlc_audio_set_format_callbacks(
        player: *mut libvlc_media_player_t,
        setup: Option<libvlc_audio_setup_cb>,
        cleanup: Option<libvlc_audio_cleanup_cb>,
    );
    pub fn libvlc_audio_set_format(
        player: *mut libvlc_media_player_t,
        format: *const c_char,
        rate: c_uint,
        channels: c_uint,
    );

    // Video output
    pub fn libvlc_video_set_callbacks(
        player: *mut libvlc_media_player_t,
        lock: Option<libvlc_video_lock_cb>,
        unlock: Option<libvlc_video_unlock_cb>,
        display: Option<libvlc_video_display_cb>,
        opaque: *mut c_void,
    );
    pub fn libvlc_video_set_format_callbacks(
        player: *mut libvlc_media_player_t,
        setup: Option<libvlc_video_format_cb>,
        cleanup: Option<libvlc_video_cleanup_cb>,
    );
    pub fn libvlc_video_set_format(
        player: *mut libvlc_media_player_t,
        chroma: *const c_char,
        width: c_uint,
        height: c_uint,
        pitch: c_uint,
    );
    pub fn libvlc_video_get_size(
        player: *mut libvlc_media_player_t,
        num: c_uint,
        px: *mut c_uint,
        py: *mut c_uint,
    ) -> c_int;

    // libvlccore
    pub fn vlc_fourcc_GetChromaDescription(fourcc: u32) -> *const vlc_chroma_description_t;
}
