//! Shellkit logging setup
//!
//! Library crates in the workspace log through `tracing` macros. This crate
//! installs a `tracing-subscriber` registry configured from the environment.
//!
//! # Usage
//!
//! ```rust
//! use shellkit_log::{Format, Level, LogConfig};
//!
//! let config = LogConfig::from_env()
//!     .level(Level::Debug)
//!     .format(Format::Compact);
//!
//! // A second init reports AlreadyInitialized instead of panicking.
//! let _ = config.init();
//! ```
//!
//! # Environment Variables
//!
//! - `SHELLKIT_DEBUG=1` - Enable debug logging
//! - `SHELLKIT_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `SHELLKIT_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `SHELLKIT_LOG_COLOR=1|0` - Enable/disable colors
//!
//! `RUST_LOG` takes precedence over the level when it holds a valid directive.

use std::env;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const DEBUG_VAR: &str = "SHELLKIT_DEBUG";
pub const LEVEL_VAR: &str = "SHELLKIT_LOG_LEVEL";
pub const FORMAT_VAR: &str = "SHELLKIT_LOG_FORMAT";
pub const COLOR_VAR: &str = "SHELLKIT_LOG_COLOR";

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// No logging
    Off,
}

impl Level {
    /// Get level from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Directive understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Format {
    /// Get format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Error)]
pub enum LogError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub color: bool,
    pub targets: bool,
    pub thread_ids: bool,
    /// Explicit filter directive, overrides `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false, // JSON output doesn't use colors
            targets: true,
            thread_ids: false,
            env_filter: None,
        }
    }
}

fn flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = lookup(DEBUG_VAR).map(|v| flag(&v)).unwrap_or(false);

        let level = lookup(LEVEL_VAR)
            .and_then(|s| Level::from_str(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup(FORMAT_VAR)
            .and_then(|s| Format::from_str(&s))
            .unwrap_or(Format::Json);

        let color = lookup(COLOR_VAR)
            .map(|v| flag(&v))
            .unwrap_or(format != Format::Json && lookup("NO_COLOR").is_none());

        Self {
            level,
            format,
            color,
            ..Self::default()
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.color = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }

    /// Use a custom filter directive such as `shellkit_tenancy=trace,info`.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Build the filter this config would install.
    pub fn filter(&self) -> Result<EnvFilter, LogError> {
        match &self.env_filter {
            Some(directive) => EnvFilter::try_new(directive)
                .map_err(|e| LogError::InvalidFilter(format!("{directive}: {e}"))),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))),
        }
    }

    /// Install the global subscriber.
    pub fn init(self) -> Result<(), LogError> {
        let filter = self.filter()?;

        let installed = match self.format {
            #[cfg(feature = "json")]
            Format::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(self.targets)
                        .with_thread_ids(self.thread_ids),
                )
                .try_init(),
            #[cfg(not(feature = "json"))]
            Format::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(self.targets)
                        .with_thread_ids(self.thread_ids)
                        .with_ansi(false),
                )
                .try_init(),
            Format::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(self.targets)
                        .with_thread_ids(self.thread_ids)
                        .with_ansi(self.color),
                )
                .try_init(),
            Format::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(self.targets)
                        .with_thread_ids(self.thread_ids)
                        .with_ansi(self.color),
                )
                .try_init(),
        };

        installed.map_err(|_| LogError::AlreadyInitialized)
    }
}

/// Install a subscriber configured from the environment.
pub fn init() -> Result<(), LogError> {
    LogConfig::from_env().init()
}
