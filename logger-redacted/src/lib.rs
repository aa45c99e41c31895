//! Logging for My Desk binaries
//!
//! Installs the `tracing` subscriber used by the record server and the
//! migration CLI, and provides a redactor that strips bearer tokens,
//! passwords, inline base64 attachments and e-mail addresses from messages
//! that embed request or response payloads.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init_tracing, LoggerConfig};
//!
//! init_tracing(&LoggerConfig::from_env()).ok();
//! logger_redacted::redacted_info!("login payload {}", r#"{"password":"secret"}"#);
//! ```

pub mod config;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::new(RedactionConfig::default());
}

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Redact `text` with the default redactor, unless redaction was disabled at init
pub fn redact(text: &str) -> String {
    if REDACTION_ENABLED.load(Ordering::Relaxed) {
        DEFAULT_REDACTOR.redact(text)
    } else {
        text.to_string()
    }
}

/// Install the global subscriber: `RUST_LOG` wins over `config.log_level`
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    REDACTION_ENABLED.store(config.redaction_enabled, Ordering::Relaxed);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .json(),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init(),
    };

    result.map_err(|e| LoggerError::Init(e.to_string()))
}
