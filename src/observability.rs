//! # Observability
//!
//! Installs a `tracing` subscriber for the pipeline. Task and phase spans, state
//! transitions and the progress of the placeholder steps are all emitted as
//! `tracing` events; nothing is printed directly.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for initializing the observability system.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// The maximum level captured for this crate.
    pub level: Level,
    pub target: LogTarget,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            target: LogTarget::default(),
        }
    }
}

impl ObservabilityConfig {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }
}

/// Output target for logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// Log to stdout.
    #[default]
    Console,
    /// Log to a file, truncating it first.
    File(String),
}

/// Builds the filter: `RUST_LOG` plus a directive for this crate at `level`.
pub fn env_filter(level: Level) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    Ok(EnvFilter::from_default_env().add_directive(format!("parallel_validation={level}").parse()?))
}

/// Initializes the global tracing subscriber.
///
/// Call once at startup. Returns an error if a global subscriber is already set
/// or the log file cannot be created.
pub fn init(config: ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::registry().with(env_filter(config.level)?);

    match config.target {
        LogTarget::Console => {
            let layer = fmt::layer().with_writer(std::io::stdout);
            subscriber.with(layer).try_init()?;
        }
        LogTarget::File(path) => {
            let file = std::fs::File::create(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(file);
            subscriber.with(layer).try_init()?;
        }
    };

    Ok(())
}
