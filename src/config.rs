use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

/// Interactive manager for a collection of routes kept in a CSV file.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Config {
    /// CSV file the collection is loaded from and saved to
    #[arg(short, long, env = "ROUTES_FILE")]
    pub file: PathBuf,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn log_level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }

    /// Diagnostics go to stderr so they never mix with command output.
    pub fn init_logging(&self) {
        tracing_subscriber::fmt()
            .with_max_level(self.log_level())
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
