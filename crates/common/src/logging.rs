//! Provides utilities to initialize logging.
use std::{env, io};

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable name for the service label, which is appended to the
/// whoami string.
pub const SVC_LABEL_ENVVAR: &str = "BIP322_SVC_LABEL";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the process in logs.
    whoami: String,

    /// Whether to print the source file of each event.
    with_file: bool,

    /// Whether to print the line number of each event.
    with_line_number: bool,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set and the file/line toggles read from the
    /// environment.
    pub fn new(whoami: String) -> Self {
        Self {
            whoami,
            with_file: env::var("LOG_FILE").is_ok_and(|v| v == "1"),
            with_line_number: env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1"),
        }
    }

    /// Creates a new instance with the whoami string set to the provided
    /// string.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Returns the whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(bip322-signer)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// Events go to stderr so that stdout stays free for command output such as signatures. Only the
/// first call installs the global subscriber, later calls are no-ops.
pub fn init(config: LoggerConfig) {
    let format = tracing_subscriber::fmt::format()
        .compact()
        .with_file(config.with_file)
        .with_line_number(config.with_line_number);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_default_env());

    if tracing_subscriber::registry()
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        trace!("logging already initialized");
        return;
    }

    info!(whoami = %config.whoami, "logging started");
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}
