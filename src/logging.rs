//! Tracing subscriber setup for the `app-launcher` binary.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `LAUNCHER_LOG` (per-target directives, e.g. `app_launcher=debug,warn`)
//! 2. `RUST_LOG`
//! 3. CLI flags (`-v` → debug, `-q` → error, otherwise info)

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV_VAR: &str = "LAUNCHER_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// `verbose` wins when both flags are set.
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// Returns an error if a subscriber is already installed.
pub fn init_subscriber(verbosity: Verbosity, json: bool) -> anyhow::Result<()> {
    let filter = build_env_filter(verbosity, |key| std::env::var(key).ok());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
        return Ok(());
    }

    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(verbosity == Verbosity::Verbose);

    if verbosity == Verbosity::Verbose {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.with_timer(fmt::time::uptime()))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.without_time().compact())
            .try_init()?;
    }
    Ok(())
}

/// Unparseable directives fall through to the next source.
fn build_env_filter<F>(verbosity: Verbosity, env: F) -> EnvFilter
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(directives) = env(LOG_ENV_VAR)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Some(directives) = env("RUST_LOG")
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    let level = verbosity.default_level();
    let directive = match verbosity {
        // sqlx logs every statement at info
        Verbosity::Normal => format!("{level},sqlx=warn"),
        _ => level.to_string(),
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
