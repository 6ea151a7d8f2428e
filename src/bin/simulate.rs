//! Headless recording session against the synthetic platform
//!
//! Captures sources, records for a while (optionally pausing in the middle),
//! stops and writes the artifact to disk. Useful for exercising the recorder
//! end to end without a real capture backend.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use open_screenrecorder_lib::commands::{recording, system};
use open_screenrecorder_lib::output::{format_file_size, OutputFormat, QualityPreset};
use open_screenrecorder_lib::recorder::SystemClock;
use open_screenrecorder_lib::synthetic::{
    SyntheticMediaDevices, SyntheticRecorderConfig, SyntheticRecorderPlatform, SyntheticSource,
};
use open_screenrecorder_lib::{init_logging, RecorderState, Settings};

#[derive(Parser, Debug)]
#[command(version, about = "Record a synthetic screen session to disk")]
struct Args {
    /// Directory (or file) the recording is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Seconds of recorded time
    #[arg(short, long, default_value_t = 3)]
    seconds: u64,

    /// Pause for this many seconds halfway through
    #[arg(long, default_value_t = 0)]
    pause_seconds: u64,

    /// Capture the webcam as a preview overlay
    #[arg(long, default_value_t = false)]
    webcam: bool,

    /// Skip the microphone
    #[arg(long, default_value_t = false)]
    no_microphone: bool,

    /// Skip system audio
    #[arg(long, default_value_t = false)]
    no_system_audio: bool,

    /// Output container (webm or mp4)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Quality preset (low, medium, high)
    #[arg(short, long)]
    quality: Option<QualityPreset>,

    /// Settings file; defaults to $SCREENRECORDER_CONFIG when set
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chunk interval in milliseconds
    #[arg(long)]
    timeslice_ms: Option<u64>,

    /// Bytes produced per chunk by the synthetic recorder
    #[arg(long, default_value_t = 4096)]
    chunk_bytes: usize,

    /// Make the webcam fail to show the degraded path
    #[arg(long, default_value_t = false)]
    fail_webcam: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::from_env()?,
    };
    if let Some(timeslice_ms) = args.timeslice_ms {
        settings.recorder.timeslice_ms = timeslice_ms;
    }
    settings.validate()?;
    init_logging(&settings.log_filter);

    let devices = Arc::new(SyntheticMediaDevices::new());
    if args.fail_webcam {
        devices.set_failure(
            SyntheticSource::Camera,
            Some(open_screenrecorder_lib::capture::PlatformError::not_found(
                "Synthetic camera disconnected",
            )),
        );
    }
    let platform = Arc::new(SyntheticRecorderPlatform::with_config(SyntheticRecorderConfig {
        auto_chunk_bytes: Some(args.chunk_bytes),
        trailing_chunk_bytes: args.chunk_bytes / 4,
        ..SyntheticRecorderConfig::default()
    }));
    let state = RecorderState::new(devices, platform, Arc::new(SystemClock), settings);

    let report = system::check_compatibility(&state).await?;
    anyhow::ensure!(report.can_record(), "Recording is not supported: {:?}", report);

    let device_list = recording::get_devices(&state).await?;
    tracing::info!(
        "{} camera(s), {} microphone(s) available",
        device_list.video.len(),
        device_list.audio.len()
    );

    if let Some(format) = args.format {
        recording::set_output_format(&state, format).await?;
    }
    if let Some(quality) = args.quality {
        recording::set_quality_preset(&state, quality).await?;
    }

    let outcome = recording::capture_sources(
        &state,
        recording::CaptureRequest {
            capture_system_audio: !args.no_system_audio,
            capture_webcam: args.webcam,
            capture_microphone: !args.no_microphone,
            ..recording::CaptureRequest::default()
        },
    )
    .await?;
    for warning in &outcome.warnings {
        tracing::warn!("{}", warning);
    }

    recording::start_recording(&state).await?;

    let total = Duration::from_secs(args.seconds);
    let half = total / 2;
    tick_for(&state, half).await?;
    if args.pause_seconds > 0 {
        if recording::pause_recording(&state).await? {
            tracing::info!("Paused for {}s", args.pause_seconds);
            tick_for(&state, Duration::from_secs(args.pause_seconds)).await?;
            recording::resume_recording(&state).await?;
        } else {
            tracing::warn!("Recorder cannot pause; continuing");
        }
    }
    tick_for(&state, total - half).await?;

    let output = recording::stop_recording(&state).await?;
    let path = recording::save_recording(&state, &args.output)
        .await
        .with_context(|| format!("saving recording under {}", args.output.display()))?;

    println!(
        "Recorded {} ms in {} chunk(s), {} ({})",
        output.total_duration_ms,
        output.chunk_count,
        format_file_size(output.size_bytes),
        output.mime_type
    );
    println!("Saved to {}", path.display());

    recording::release_sources(&state).await?;
    Ok(())
}

/// Keep the recorder state in sync for `duration`, the way a UI timer would
async fn tick_for(state: &RecorderState, duration: Duration) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + duration;
    let mut interval = tokio::time::interval(Duration::from_millis(250));
    loop {
        interval.tick().await;
        let recording = recording::sync_recorder(state).await?;
        tracing::debug!(
            "{} - {} ms, {} chunk(s)",
            recording.status,
            recording.duration_ms,
            recording.chunk_count
        );
        if tokio::time::Instant::now() >= deadline {
            return Ok(());
        }
    }
}
