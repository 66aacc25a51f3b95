use std::process::Command;
use std::env;

fn main() {
    // Set build-time environment variables
    set_build_info();

    // Link the driver library when the hardware backend is enabled
    link_driver();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
}

fn set_build_info() {
    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    // Get git commit hash if available
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT={}", commit);

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TARGET_TRIPLE={}", target);
}

fn link_driver() {
    if env::var("CARGO_FEATURE_BLADERF").is_err() {
        return;
    }

    // Allow a non-standard install prefix, e.g. a locally built libbladeRF
    println!("cargo:rerun-if-env-changed=BLADERF_LIB_DIR");
    if let Ok(dir) = env::var("BLADERF_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    println!("cargo:rustc-link-lib=bladeRF");
}
