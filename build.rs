use std::env;
use std::path::PathBuf;

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // ffmpeg-sys-next finds FFmpeg through pkg-config everywhere except Windows.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=framegrab needs FFmpeg development libraries; set FFMPEG_DIR (or VCPKG_ROOT with a vcpkg FFmpeg install)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if candidate.exists() {
        println!(
            "cargo:warning=Found vcpkg FFmpeg at {0}; export FFMPEG_DIR={0} to pin it.",
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=VCPKG_ROOT is set but {} does not exist.",
            candidate.display(),
        );
    }
}
