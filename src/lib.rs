//! Open ScreenRecorder - screen, webcam and microphone recording.
//!
//! This is the main library crate. It provides media capture, the recorder
//! state machine, output assembly and the command layer a frontend drives.

pub mod capture;
pub mod commands;
pub mod config;
pub mod output;
pub mod recorder;
pub mod state;
pub mod studio;
pub mod synthetic;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use commands::recording::RecorderState;
pub use config::Settings;
pub use studio::Studio;

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once is harmless.
pub fn init_logging(default_filter: &str) {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Starting Open ScreenRecorder v{}", env!("CARGO_PKG_VERSION"));
    }
}
