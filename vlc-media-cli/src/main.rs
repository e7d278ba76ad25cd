//! VlcMedia CLI Tool
//!
//! Inspect engine settings, probe media and play it headlessly through the
//! sample queues.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use vlc_media::{EngineInstance, MediaEvent, MediaOptions, VlcMediaPlayer, VlcMediaSettings};
use vlc_media_core::{TextureSample, TextureSampleFormat, TimeRange, TrackKind};

/// Interval between player ticks
const TICK: Duration = Duration::from_millis(16);

/// How long `probe` waits for the media to be parsed
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "vlcmedia")]
#[command(about = "VlcMedia - LibVLC media player adapter tools")]
#[command(version)]
struct Cli {
    /// Settings file (JSON); defaults are used when omitted
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Log everything, including per-callback traffic
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the engine startup arguments for the settings
    Args {
        /// Print the resolved settings as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Open a media and print its tracks
    Probe {
        /// Media URL (file://, http://, rtsp://, ...)
        url: String,
    },

    /// Play a media headlessly, draining the sample queues
    Play {
        /// Media URL (file://, http://, rtsp://, ...)
        url: String,

        /// Seconds of playback
        #[arg(long, default_value = "5")]
        seconds: u64,

        /// Read local files into memory before playing
        #[arg(long)]
        precache: bool,

        /// Loop the media
        #[arg(long = "loop")]
        looping: bool,

        /// Save the last video frame as an image
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.settings.as_deref())?;

    match cli.command {
        Commands::Args { json } => print_args(&settings, json)?,
        Commands::Probe { url } => probe(settings, &url)?,
        Commands::Play {
            url,
            seconds,
            precache,
            looping,
            snapshot,
        } => {
            let options = MediaOptions {
                precache_file: precache,
                ..Default::default()
            };
            play(settings, &url, &options, Duration::from_secs(seconds), looping, snapshot)?
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "trace" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}

fn load_settings(path: Option<&Path>) -> Result<VlcMediaSettings> {
    match path {
        Some(path) => VlcMediaSettings::from_json_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(VlcMediaSettings::default()),
    }
}

fn print_args(settings: &VlcMediaSettings, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        println!("{text}");
        return Ok(());
    }

    for arg in settings.engine_args() {
        println!("{arg}");
    }
    Ok(())
}

#[cfg(feature = "libvlc")]
fn start_engine(settings: VlcMediaSettings) -> Result<EngineInstance> {
    EngineInstance::start(settings).context("Failed to start libvlc")
}

#[cfg(not(feature = "libvlc"))]
fn start_engine(_settings: VlcMediaSettings) -> Result<EngineInstance> {
    anyhow::bail!("vlcmedia was built without the `libvlc` feature")
}

fn open(player: &mut VlcMediaPlayer, url: &str, options: &MediaOptions) -> Result<()> {
    if !player.open(url, options) {
        anyhow::bail!("Failed to open {url}");
    }
    Ok(())
}

fn probe(settings: VlcMediaSettings, url: &str) -> Result<()> {
    let engine = start_engine(settings)?;
    let mut player = engine.create_player();
    let events = player.subscribe();

    println!("Probing: {url}");
    open(&mut player, url, &MediaOptions::default())?;
    // parsing only starts once playback does
    if !player.set_rate(1.0) {
        anyhow::bail!("Failed to start playback");
    }

    let started = Instant::now();
    let mut parsed = false;
    while !parsed && started.elapsed() < PROBE_TIMEOUT {
        thread::sleep(TICK);
        player.tick(TICK);
        parsed = events.try_iter().any(|event| event == MediaEvent::TracksChanged);
    }
    player.set_rate(0.0);

    if !parsed {
        tracing::warn!("media was not parsed within {:?}", PROBE_TIMEOUT);
    }

    print_media_info(&player);
    player.close();
    Ok(())
}

fn print_media_info(player: &VlcMediaPlayer) {
    println!("\n=== Media Information ===");
    println!("URL: {}", player.url());
    println!("Duration: {:.2} seconds", player.duration().as_secs_f64());
    println!("Seekable: {}", player.supports_seeking());

    let tracks = player.tracks();
    for kind in TrackKind::ALL {
        println!("\n=== {} Tracks ===", kind);
        let selected = tracks.selected_track(kind);
        for (index, track) in tracks.tracks(kind).iter().enumerate() {
            let marker = if selected == Some(index) { "*" } else { " " };
            println!("{marker} [{index}] {} (id {})", track.display_name, track.id);
        }
    }

    if !player.info().is_empty() {
        println!("\n=== Streams ===");
        print!("{}", player.info());
    }
}

fn play(
    settings: VlcMediaSettings,
    url: &str,
    options: &MediaOptions,
    length: Duration,
    looping: bool,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    let engine = start_engine(settings)?;
    let mut player = engine.create_player();
    let events = player.subscribe();

    open(&mut player, url, options)?;
    player.set_looping(looping);
    if !player.set_rate(1.0) {
        anyhow::bail!("Failed to start playback");
    }

    println!("Playing {url} for {} seconds", length.as_secs());
    let everything: TimeRange = Duration::ZERO..Duration::MAX;
    let (mut audio_blocks, mut video_frames) = (0u64, 0u64);
    let mut last_frame = None;

    let started = Instant::now();
    let mut last_tick = started;
    while started.elapsed() < length {
        thread::sleep(TICK);
        let now = Instant::now();
        player.tick(now - last_tick);
        last_tick = now;

        for event in events.try_iter() {
            tracing::info!(?event, time = ?player.time(), "media event");
        }
        while player.fetch_audio(&everything).is_some() {
            audio_blocks += 1;
        }
        while let Some(frame) = player.fetch_video(&everything) {
            video_frames += 1;
            last_frame = Some(frame);
        }
        while let Some(metadata) = player.fetch_metadata(&everything) {
            println!("{}", String::from_utf8_lossy(&metadata.data));
        }
    }

    println!("\n=== Playback Summary ===");
    println!("Time: {:.2} seconds", player.time().as_secs_f64());
    println!("Audio blocks: {audio_blocks}");
    println!("Video frames: {video_frames}");
    println!("{:?}", player.bridge_stats());
    println!("{}", player.stats());

    if let Some(path) = snapshot {
        let frame = last_frame.context("No video frame was decoded")?;
        let image = frame_to_image(&frame).context("Snapshot needs a BGRA video frame")?;
        image.save(&path).context("Failed to save snapshot")?;
        println!("Saved snapshot to {}", path.display());
    }

    player.close();
    Ok(())
}

fn frame_to_image(frame: &TextureSample) -> Option<RgbaImage> {
    if frame.format != TextureSampleFormat::CharBgra {
        return None;
    }
    bgra_to_rgba(frame.data(), frame.stride, frame.output_dim)
}

/// Converts the visible part of a BGRA buffer to an RGBA image
fn bgra_to_rgba(data: &[u8], stride: u32, (width, height): (u32, u32)) -> Option<RgbaImage> {
    let row_bytes = width as usize * 4;
    if (stride as usize) < row_bytes || data.len() < stride as usize * height as usize {
        return None;
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(stride as usize).take(height as usize) {
        for bgra in row[..row_bytes].chunks_exact(4) {
            pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
        }
    }
    RgbaImage::from_raw(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_command() {
        let cli = Cli::try_parse_from([
            "vlcmedia",
            "play",
            "file:///movies/a.mp4",
            "--seconds",
            "2",
            "--loop",
            "--snapshot",
            "frame.png",
        ])
        .unwrap();

        match cli.command {
            Commands::Play {
                url,
                seconds,
                looping,
                snapshot,
                precache,
            } => {
                assert_eq!(url, "file:///movies/a.mp4");
                assert_eq!(seconds, 2);
                assert!(looping);
                assert!(!precache);
                assert_eq!(snapshot, Some(PathBuf::from("frame.png")));
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vlcmedia", "args", "--json", "-v", "--settings", "s.json"]).unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("s.json")));
        assert!(matches!(cli.command, Commands::Args { json: true }));
    }

    #[test]
    fn test_probe_requires_url() {
        assert!(Cli::try_parse_from(["vlcmedia", "probe"]).is_err());
    }

    #[test]
    fn test_bgra_to_rgba_skips_row_padding() {
        // 1x2 image, 8-byte stride
        let data = [
            1, 2, 3, 4, 0xEE, 0xEE, 0xEE, 0xEE, //
            5, 6, 7, 8, 0xEE, 0xEE, 0xEE, 0xEE,
        ];
        let image = bgra_to_rgba(&data, 8, (1, 2)).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1, 4]);
        assert_eq!(image.get_pixel(0, 1).0, [7, 6, 5, 8]);
    }

    #[test]
    fn test_bgra_to_rgba_rejects_short_buffer() {
        assert!(bgra_to_rgba(&[0; 12], 8, (2, 2)).is_none());
        assert!(bgra_to_rgba(&[0; 64], 4, (2, 2)).is_none());
    }

    #[test]
    fn test_default_settings_print() {
        assert!(print_args(&VlcMediaSettings::default(), false).is_ok());
        assert!(print_args(&VlcMediaSettings::default(), true).is_ok());
    }
}
