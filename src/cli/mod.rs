//! CLI interface for polyvox

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// Event-driven polyphonic voice engine
#[derive(Parser)]
#[command(name = "polyvox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Max log level for the chosen verbosity
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play the configured events on the default output device
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "polyvox.yaml")]
        config: PathBuf,

        /// Stop scheduling after this many seconds (runs until Ctrl-C otherwise)
        #[arg(short, long, value_parser = parse_seconds)]
        duration: Option<f64>,
    },

    /// Render to a WAV file
    Render {
        /// Configuration file path
        #[arg(short, long, default_value = "polyvox.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "10", value_parser = parse_seconds)]
        duration: f64,
    },

    /// Validate a configuration file against the instrument it names
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "polyvox.yaml")]
        config: PathBuf,
    },

    /// Print the first events of a schedule as JSON lines
    Events {
        /// Configuration file path
        #[arg(short, long, default_value = "polyvox.yaml")]
        config: PathBuf,

        /// Number of events to print
        #[arg(short = 'n', long, default_value = "8")]
        count: usize,
    },

    /// List built-in instruments and the parameters they read
    Instruments,

    /// List available audio devices
    Devices,

    /// Generate an example configuration file
    Init,
}

/// A finite, non-negative number of seconds
fn parse_seconds(s: &str) -> Result<f64, String> {
    let seconds: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("`{}` is not a valid number of seconds", s));
    }
    Ok(seconds)
}
