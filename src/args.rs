use std::{fs::File, io, sync::Mutex, time::Duration};

use anyhow::{ensure, Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Player name to follow, as in `org.mpris.MediaPlayer2.<PLAYER>`.
    /// If not specified, follows the first player that shows up.
    #[clap(long, short, default_value = "all")]
    pub player: String,
    /// Ask the player for its position every X seconds
    #[clap(long, default_value_t = 1.0)]
    pub poll_interval: f64,
    /// Refresh the displayed position every X milliseconds
    #[clap(long, default_value_t = 100)]
    pub tick_interval: u64,
    /// How to publish the current lyric line
    #[clap(long, short, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<String>,
}

/// Validated run-time settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub player: String,
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    pub output: OutputFormat,
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened.
    pub fn init_tracing_subscriber(&self) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => {
                let file = File::create(f).with_context(|| format!("Failed to open log file {f}"))?;
                builder.with_writer(Mutex::new(file)).init();
            }
        }
        Ok(())
    }

    /// Check the arguments and turn them into [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns an error if an interval is not a positive duration.
    pub fn settings(&self) -> Result<Settings> {
        let poll_interval = Duration::try_from_secs_f64(self.poll_interval)
            .with_context(|| format!("Invalid poll interval {}", self.poll_interval))?;
        ensure!(!poll_interval.is_zero(), "Poll interval must be positive");
        ensure!(self.tick_interval > 0, "Tick interval must be positive");
        ensure!(!self.player.is_empty(), "Player name must not be empty");
        Ok(Settings {
            player: self.player.clone(),
            poll_interval,
            tick_interval: Duration::from_millis(self.tick_interval),
            output: self.output,
        })
    }
}
