mod cli;

use clap::Parser;

use cli::{Args, Command, PreviewOptions};
use framegrab::config::Config;

fn main() {
    let args = Args::parse();

    match args.command {
        Command::ListDevices => cli::list_devices(),
        Command::Preview {
            device,
            unique_id,
            resolution,
            fps,
            format,
            pattern,
            mirror,
            duration,
        } => {
            let config = match Config::load(args.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let opts = PreviewOptions {
                device,
                unique_id,
                resolution,
                fps,
                format: format.map(Into::into),
                pattern: pattern.into(),
                mirror,
                duration,
            };
            if let Err(e) = cli::preview(&config, opts) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Config { action } => cli::handle_config_action(action, args.config.as_deref()),
    }
}
