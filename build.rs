//! Build script exporting the build environment and, when the `opencv`
//! feature is enabled, checking for the system OpenCV installation.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the OpenCV solver needs system libraries
    if env::var_os("CARGO_FEATURE_OPENCV").is_some() {
        check_pkg_config();
        check_opencv();
    }

    // Print detected environment
    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
    println!("cargo:rustc-env=BUILD_HOST={}", env::var("HOST").unwrap_or_default());
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    // opencv4 first, then the legacy package name
    let version = ["opencv4", "opencv"].iter().find_map(|package| {
        Command::new("pkg-config")
            .args(["--modversion", package])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
    });

    match version {
        Some(version) => println!("cargo:warning=Found OpenCV version: {}", version),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. The `opencv` feature needs it installed.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
            println!("cargo:warning=On macOS: brew install opencv");
            println!("cargo:warning=Or build without the feature to use the built-in POSIT solver");
        }
    }
}

fn check_pkg_config() {
    let output = Command::new("pkg-config").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {}
        _ => {
            println!("cargo:warning=pkg-config not found. It is required to locate OpenCV.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
        }
    }
}
