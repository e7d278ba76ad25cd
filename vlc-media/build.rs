/// Build script for vlc-media
///
/// When the `libvlc` feature is enabled, emits the link directives for the
/// native libvlc and libvlccore libraries. Without the feature nothing is
/// linked and the crate only exposes the native boundary traits.
use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=VLC_LIB_DIR");

    if env::var_os("CARGO_FEATURE_LIBVLC").is_none() {
        return;
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    // ── Library search path ──
    // Explicit override first, then the platform's usual install location.
    if let Some(dir) = env::var_os("VLC_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    } else {
        match target_os.as_str() {
            "macos" => {
                println!("cargo:rustc-link-search=native=/Applications/VLC.app/Contents/MacOS/lib");
            }
            "windows" => {
                println!("cargo:rustc-link-search=native=C:\\Program Files\\VideoLAN\\VLC\\sdk\\lib");
            }
            _ => {}
        }
    }

    // ── Libraries ──
    // The Windows SDK ships import libraries named libvlc.lib / libvlccore.lib.
    if target_os == "windows" {
        println!("cargo:rustc-link-lib=dylib=libvlc");
        println!("cargo:rustc-link-lib=dylib=libvlccore");
    } else {
        println!("cargo:rustc-link-lib=dylib=vlc");
        println!("cargo:rustc-link-lib=dylib=vlccore");
    }
}
