//! Command-line interface definitions and helpers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction};
pub use commands::{handle_config_action, list_devices, preview, PreviewOptions};
pub use enums::{FormatArg, PatternArg};
