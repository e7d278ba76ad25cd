//! Engine and playback settings
//!
//! [`VlcMediaSettings`] is read once when the engine instance starts and is
//! turned into the native engine's startup arguments. [`MediaOptions`] is
//! passed to every open call.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vlc_media_core::{FourCc, TextureSampleFormat};

/// Native engine log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VlcLogLevel {
    Debug = 0,
    Notice = 2,
    #[default]
    Warning = 3,
    Error = 4,
}

impl VlcLogLevel {
    /// Startup argument selecting this verbosity
    pub fn engine_arg(self) -> &'static str {
        match self {
            Self::Debug => "--verbose=2",
            Self::Notice => "--verbose=1",
            Self::Warning => "--verbose=0",
            Self::Error => "--quiet",
        }
    }
}

/// Chroma fallback when the decoder proposes a format that can't be
/// delivered as a packed texture.
///
/// Multi-plane (planar) formats fall back to `multi_plane`, anything else to
/// `single_plane`. Both must be packed formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFallbackPolicy {
    pub single_plane: FourCc,
    pub multi_plane: FourCc,
}

impl Default for VideoFallbackPolicy {
    fn default() -> Self {
        Self {
            single_plane: FourCc::RV32,
            multi_plane: FourCc::YUY2,
        }
    }
}

impl VideoFallbackPolicy {
    /// Texture format delivered for a fallback chroma
    pub fn texture_format(chroma: FourCc) -> Option<TextureSampleFormat> {
        let format = if chroma == FourCc::AYUV {
            TextureSampleFormat::CharAyuv
        } else if chroma == FourCc::RV32 {
            TextureSampleFormat::CharBgra
        } else if chroma.is_any_of(&[FourCc::UYVY, FourCc::Y422, FourCc::UYNV, FourCc::HDYC]) {
            TextureSampleFormat::CharUyvy
        } else if chroma.is_any_of(&[FourCc::YUY2, FourCc::V422, FourCc::YUYV]) {
            TextureSampleFormat::CharYuy2
        } else if chroma == FourCc::YVYU {
            TextureSampleFormat::CharYvyu
        } else {
            return None;
        };
        Some(format)
    }
}

/// Bounds for the sample buffer pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Video frames in flight (locked by the decoder, queued or held by the consumer)
    pub video_pool_capacity: usize,
    /// Audio blocks in flight
    pub audio_pool_capacity: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            video_pool_capacity: 24,
            audio_pool_capacity: 64,
        }
    }
}

/// Settings of the native engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlcMediaSettings {
    /// Caching for optical discs, in milliseconds
    pub disc_caching_ms: u32,
    /// Caching for local files, in milliseconds
    pub file_caching_ms: u32,
    /// Caching for cameras and microphones, in milliseconds
    pub live_caching_ms: u32,
    /// Caching for network resources, in milliseconds
    pub network_caching_ms: u32,
    pub log_level: VlcLogLevel,
    /// Keep native decoder statistics
    pub collect_stats: bool,
    /// Write the native engine log to this file
    pub log_file: Option<PathBuf>,
    pub video_fallback: VideoFallbackPolicy,
    pub output: OutputSettings,
}

impl Default for VlcMediaSettings {
    fn default() -> Self {
        Self {
            disc_caching_ms: 1000,
            file_caching_ms: 1000,
            live_caching_ms: 1000,
            network_caching_ms: 1000,
            log_level: VlcLogLevel::default(),
            collect_stats: true,
            log_file: None,
            video_fallback: VideoFallbackPolicy::default(),
            output: OutputSettings::default(),
        }
    }
}

impl VlcMediaSettings {
    /// Loads settings from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Startup arguments for the native engine instance
    pub fn engine_args(&self) -> Vec<String> {
        let mut args = vec![
            // caching
            format!("--disc-caching={}", self.disc_caching_ms),
            format!("--file-caching={}", self.file_caching_ms),
            format!("--live-caching={}", self.live_caching_ms),
            format!("--network-caching={}", self.network_caching_ms),
            // config
            "--ignore-config".to_string(),
        ];

        // logging
        if let Some(log_file) = &self.log_file {
            args.push("--file-logging".to_string());
            args.push(format!("--logfile={}", log_file.display()));
        }
        args.push(self.log_level.engine_arg().to_string());

        // output
        for arg in [
            "--aout",
            "amem",
            "--intf",
            "dummy",
            "--text-renderer",
            "dummy",
            "--vout",
            "vmem",
            // performance
            "--drop-late-frames",
            // undesired features
            "--no-disable-screensaver",
            "--no-plugins-cache",
            "--no-snapshot-preview",
            "--no-video-title-show",
        ] {
            args.push(arg.to_string());
        }

        if !self.collect_stats {
            args.push("--no-stats".to_string());
        }

        if cfg!(target_os = "linux") {
            args.push("--no-xlib".to_string());
        }

        args
    }
}

/// Options for a single open call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaOptions {
    /// Read local files into memory and play them from there
    pub precache_file: bool,
    /// Publish samples into the sample queues when no sink is attached
    pub deliver_to_queues: bool,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            precache_file: false,
            deliver_to_queues: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_args() {
        let args = VlcMediaSettings::default().engine_args();

        assert_eq!(args[0], "--disc-caching=1000");
        assert_eq!(args[3], "--network-caching=1000");
        assert!(args.contains(&"--ignore-config".to_string()));
        assert!(args.contains(&"--verbose=0".to_string()));
        assert!(args.contains(&"vmem".to_string()));
        assert!(!args.contains(&"--no-stats".to_string()));
        assert!(!args.iter().any(|arg| arg.starts_with("--logfile")));
    }

    #[test]
    fn test_engine_args_with_logging() {
        let settings = VlcMediaSettings {
            log_level: VlcLogLevel::Error,
            log_file: Some(PathBuf::from("/tmp/vlc.log")),
            collect_stats: false,
            ..Default::default()
        };
        let args = settings.engine_args();

        assert!(args.contains(&"--quiet".to_string()));
        assert!(args.contains(&"--file-logging".to_string()));
        assert!(args.contains(&"--logfile=/tmp/vlc.log".to_string()));
        assert!(args.contains(&"--no-stats".to_string()));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings = VlcMediaSettings::from_json(
            r#"{
                "file_caching_ms": 300,
                "log_level": "Debug",
                "video_fallback": { "multi_plane": "UYVY" }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.file_caching_ms, 300);
        assert_eq!(settings.network_caching_ms, 1000);
        assert_eq!(settings.log_level, VlcLogLevel::Debug);
        assert_eq!(settings.video_fallback.multi_plane, FourCc::UYVY);
        assert_eq!(settings.video_fallback.single_plane, FourCc::RV32);
        assert_eq!(settings.output, OutputSettings::default());
    }

    #[test]
    fn test_settings_reject_bad_fourcc() {
        let result = VlcMediaSettings::from_json(r#"{ "video_fallback": { "single_plane": "TOOLONG" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_texture_formats() {
        assert_eq!(
            VideoFallbackPolicy::texture_format(FourCc::YUY2),
            Some(TextureSampleFormat::CharYuy2)
        );
        assert_eq!(
            VideoFallbackPolicy::texture_format(FourCc::HDYC),
            Some(TextureSampleFormat::CharUyvy)
        );
        assert_eq!(VideoFallbackPolicy::texture_format(FourCc::S16N), None);
    }

    #[test]
    fn test_media_options_default_to_queues() {
        let options = MediaOptions::default();
        assert!(options.deliver_to_queues);
        assert!(!options.precache_file);
    }
}
