//! Logging utilities for the autoservice crates.
//!
//! This module provides a standardized approach to logging across all crates.
//! It includes functions for initializing the tracing subscriber and small helpers
//! for logging results and masking customer data.

use std::path::Path;
use std::str::FromStr;

use autoservice_config::models::LoggingConfig;
use tracing::{error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{AutoserviceError, Context};

/// Initialize the tracing subscriber at INFO level.
///
/// # Examples
///
/// ```
/// use autoservice_common::logging;
///
/// // Initialize with default log level (INFO)
/// logging::init();
///
/// // Calling it again is harmless
/// logging::init_with_level(tracing::Level::DEBUG);
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

fn filter_for(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("autoservice={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initialize the tracing subscriber with a specific log level.
///
/// Uses `try_init`, so a subscriber that was already installed (by a test harness or
/// the embedding application) is left in place.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging to stdout and to a daily rolling file in `directory`.
///
/// The returned guard must be kept alive for as long as logs should be flushed.
pub fn init_with_file(directory: &Path, level: Level) -> Result<WorkerGuard, AutoserviceError> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("creating log directory {}", directory.display()))?;
    let appender = tracing_appender::rolling::daily(directory, "autoservice.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_line_number(true))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized at level: {} (file: {})",
            level,
            directory.display()
        );
    }
    Ok(guard)
}

/// Initialize logging from the `[logging]` configuration section.
///
/// An unknown level falls back to INFO. Returns the file writer guard when a
/// directory is configured.
pub fn init_from_config(config: &LoggingConfig) -> Result<Option<WorkerGuard>, AutoserviceError> {
    let level = parse_level(&config.level);
    let guard = match config.directory.as_deref() {
        Some(directory) => Some(init_with_file(Path::new(directory), level)?),
        None => {
            init_with_level(level);
            None
        }
    };
    if Level::from_str(config.level.trim()).is_err() {
        warn!("Unknown log level '{}', using {}", config.level, level);
    }
    Ok(guard)
}

fn parse_level(raw: &str) -> Level {
    Level::from_str(raw.trim()).unwrap_or(Level::INFO)
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result, allowing this function to be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}

/// Hides all but the last two digits of a phone number for log output.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let visible = digits.len().saturating_sub(2);
    digits
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}
