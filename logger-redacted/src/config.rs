// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable, colored when attached to a terminal
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub redaction_enabled: bool,
    pub format: LogFormat,
    /// Default filter directive used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            format: LogFormat::Pretty,
            log_level: "info".to_string(),
        }
    }
}

impl LoggerConfig {
    /// Read `MYDESK_LOG_FORMAT` (`json` | `pretty`) and `MYDESK_LOG_REDACTION`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(format) = std::env::var("MYDESK_LOG_FORMAT") {
            if format.eq_ignore_ascii_case("json") {
                config.format = LogFormat::Json;
            }
        }

        if let Ok(flag) = std::env::var("MYDESK_LOG_REDACTION") {
            config.redaction_enabled = !matches!(flag.as_str(), "0" | "false" | "off");
        }

        config
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}
