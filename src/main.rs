use clap::Parser;
use scorebook::cli::output;
use scorebook::cli::Cli;
use tracing::error;

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

fn main() {
    let cli = Cli::parse();

    let config = match cli.app_config() {
        Ok(config) => config,
        Err(e) => {
            init_logging_simple();
            output::print_error(&format!("Failed to load configuration: {e:#}"));
            std::process::exit(2);
        }
    };

    if cli.is_long_running() {
        init_logging(&config.logging);
    } else {
        init_logging_simple();
    }

    if let Err(e) = cli.run(config) {
        error!("{e:#}");
        output::print_error(&format!("✗ {e:#}"));
        std::process::exit(1);
    }
}
