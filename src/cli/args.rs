//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{FormatArg, PatternArg};

/// Camera capture harness driving the synthetic device host
#[derive(Parser, Debug)]
#[command(name = "framegrab")]
#[command(version, about = "Camera capture pipeline harness", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available capture devices
    ListDevices,
    /// Run a capture session and print per-second frame statistics
    Preview {
        /// Device index (from list-devices)
        #[arg(long)]
        device: Option<usize>,

        /// Select by stable unique ID instead of index
        #[arg(long)]
        unique_id: Option<String>,

        /// Requested resolution (WIDTHxHEIGHT; the device may coerce)
        #[arg(long, value_parser = parse_resolution)]
        resolution: Option<(u32, u32)>,

        /// Desired frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Pixel format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Test pattern for the synthetic devices
        #[arg(long, value_enum, default_value = "bars")]
        pattern: PatternArg,

        /// Mirror horizontally
        #[arg(long)]
        mirror: bool,

        /// Stop after this many seconds (default: run until Ctrl+C)
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Parse and validate resolution (WIDTHxHEIGHT format)
pub fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 640x480)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok((width, height))
}
