//! Subcommand handlers for list-devices, preview, and config actions.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use framegrab::config::{default_path, Config};
use framegrab::grabber::{
    CaptureSession, ControlCapabilities, DeviceEnumerator, GrabError, PixelFormat,
};
use framegrab::synthetic::{SyntheticDevice, SyntheticHost, TestPattern};

use super::args::ConfigAction;

static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received.
fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler. Called once before the preview loop.
fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

/// The demo device host: a webcam-like pattern generator plus a
/// deck-style source with transport controls. Platform hosts are out of
/// tree; the binary exists to exercise the pipeline end to end.
fn demo_host(pattern: TestPattern) -> Arc<SyntheticHost> {
    Arc::new(
        SyntheticHost::new()
            .with_device(
                SyntheticDevice::new("Test Pattern Camera")
                    .with_model_id("pattern-gen")
                    .with_formats(vec![
                        PixelFormat::Rgb,
                        PixelFormat::Rgba,
                        PixelFormat::Yuyv,
                        PixelFormat::Nv12,
                    ])
                    .with_pattern(pattern),
            )
            .with_device(
                SyntheticDevice::new("Synthetic Deck")
                    .with_model_id("deck-sim")
                    .with_capabilities(ControlCapabilities::deck())
                    .with_frame_interval(Duration::from_millis(40))
                    .with_pattern(pattern),
            ),
    )
}

/// List available capture devices and print them to stdout.
pub fn list_devices() {
    let enumerator = DeviceEnumerator::new(demo_host(TestPattern::ColorBars));
    match enumerator.devices() {
        Ok(devices) => {
            if devices.is_empty() {
                println!("No capture devices found.");
            } else {
                println!("Available capture devices:");
                for device in &devices {
                    println!("  {}", device);
                    println!("      unique ID: {}", device.unique_id);
                    let formats: Vec<String> = device
                        .supported_formats
                        .iter()
                        .map(|f| f.to_string())
                        .collect();
                    println!("      formats:   {}", formats.join(", "));
                }
                println!();
                println!("Use --device <index> or --unique-id <id> to select a device.");
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Options for the preview loop, CLI-side. `None` fields fall back to
/// the loaded config.
pub struct PreviewOptions {
    pub device: Option<usize>,
    pub unique_id: Option<String>,
    pub resolution: Option<(u32, u32)>,
    pub fps: Option<u32>,
    pub format: Option<PixelFormat>,
    pub pattern: TestPattern,
    pub mirror: bool,
    pub duration: Option<u64>,
}

/// Run a capture session and print per-second frame statistics until
/// Ctrl+C or the configured duration.
pub fn preview(config: &Config, opts: PreviewOptions) -> Result<(), GrabError> {
    let mut session = CaptureSession::new(demo_host(opts.pattern));

    if let Some(unique_id) = &opts.unique_id {
        session.set_device_unique_id(unique_id);
    } else if let Some(index) = opts.device {
        session.set_device(index);
    } else if let Some(unique_id) = &config.device.unique_id {
        session.set_device_unique_id(unique_id);
    } else {
        session.set_device(config.device.index);
    }

    let (width, height) = opts
        .resolution
        .unwrap_or((config.capture.width, config.capture.height));
    session.set_desired_frame_rate(opts.fps.unwrap_or(config.capture.fps));
    session.set_mirror(opts.mirror || config.capture.mirror);

    let format = opts.format.unwrap_or(config.capture.format);
    if !session.set_pixel_format(format) {
        return Err(GrabError::UnsupportedFormat(format));
    }

    session.setup(width, height)?;
    println!(
        "Capturing from '{}' at {}x{} {}",
        session.localized_name().unwrap_or("?"),
        session.width(),
        session.height(),
        format
    );

    if let Err(e) = setup_ctrlc_handler() {
        eprintln!("Warning: could not install Ctrl+C handler: {}", e);
    }

    let deadline = opts
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut published: u64 = 0;
    let mut published_this_second: u64 = 0;
    let mut last_report = Instant::now();

    loop {
        if ctrlc_received() {
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        session.update();
        if session.is_frame_new() {
            published += 1;
            published_this_second += 1;
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            println!("{:>3} fps", published_this_second);
            published_this_second = 0;
            last_report = Instant::now();
        }

        thread::sleep(Duration::from_millis(5));
    }

    let delivered = session.frames_delivered();
    session.close()?;
    println!(
        "Published {} of {} delivered frame(s); the rest were superseded between polls.",
        published, delivered
    );
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) {
    match action {
        ConfigAction::Show => match Config::load(config_path) {
            Ok(config) => {
                println!("Current configuration:");
                match &config.device.unique_id {
                    Some(id) => println!("  Device:  unique ID {}", id),
                    None => println!("  Device:  index {}", config.device.index),
                }
                println!(
                    "  Capture: {}x{} @ {} fps, {}",
                    config.capture.width,
                    config.capture.height,
                    config.capture.fps,
                    config.capture.format
                );
                println!("  Mirror:  {}", if config.capture.mirror { "yes" } else { "no" });
                println!();

                let path = config_path.map(PathBuf::from).unwrap_or_else(default_path);
                if path.exists() {
                    println!("Config file: {} (exists)", path.display());
                } else {
                    println!("Config file: {} (not found)", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        ConfigAction::Init => {
            let path = config_path.map(PathBuf::from).unwrap_or_else(default_path);
            if path.exists() {
                println!("Config file already exists: {}", path.display());
                return;
            }
            match Config::write_default(&path) {
                Ok(()) => println!("Created config file: {}", path.display()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
