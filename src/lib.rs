//! RX Gap Tester
//!
//! Drives a software defined radio receiver through timed synchronous
//! receive calls and checks that the sample-stream timestamps advance by
//! exactly the expected step, with no gaps or overlaps.

pub mod app;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use device::{DeviceError, DeviceErrorKind, RxDevice, RxMetadata, SimulatedDevice};
pub use executor::GapTestRunner;
pub use models::{CaseResult, Config, RunReport, StreamParams, TestCase};
pub use output::{ColoredFormatter, OutputCoordinator, OutputFormatter, OutputFormatterFactory, PlainFormatter};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const BUILD_TIME: &str = env!("BUILD_TIME");

/// Default configuration values
pub mod defaults {
    /// Number of sample buffers handed to the driver's sync interface
    pub const NUM_BUFFERS: u32 = 16;
    /// Number of in-flight USB transfers
    pub const NUM_TRANSFERS: u32 = 8;
    /// Samples per buffer; also the upper bound on a single read
    pub const BUFFER_SIZE: u32 = 64 * 1024;
    /// Stream and per-read timeout
    pub const TIMEOUT_MS: u32 = 1000;

    /// Timestamp ticks per received sample. Current FPGA images count
    /// at twice the sample rate.
    pub const TIMESTAMP_STEP: u64 = 2;

    /// `(read size, iterations)` pairs run when no case is given
    pub const DEFAULT_CASES: &[(u64, u32)] = &[(1023, 10_000), (1024, 10_000), (1025, 10_000)];

    /// Long soak table, enabled with `--extended`
    pub const EXTENDED_CASES: &[(u64, u32)] = &[
        (1, 10_000_000),
        (2, 10_000_000),
        (128, 10_000_000),
        (256, 5_000_000),
        (512, 5_000_000),
        (1023, 10_000),
        (1024, 10_000),
        (1025, 10_000),
        (2048, 5000),
        (3172, 5000),
        (4096, 2500),
        (8192, 2500),
        (16 * 1024, 1000),
        (32 * 1024, 1000),
        (64 * 1024, 1000),
    ];

    pub const DEFAULT_BACKEND: &str = "sim";
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Simulator clock defaults
    pub const SIM_START_TIMESTAMP: u64 = 0x1000;
    pub const SIM_TICKS_PER_SAMPLE: u64 = TIMESTAMP_STEP;

    /// Anomalies kept per case; later ones are only counted
    pub const MAX_RECORDED_ANOMALIES: usize = 64;
}
