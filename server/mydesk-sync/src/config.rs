//! Sync engine configuration

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the office-list step decides whether the merged list must be pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeChangeDetection {
    /// Push only when the merged list length differs from the remote length.
    /// Equal-length lists with different content are not pushed.
    #[default]
    LengthOnly,
    /// Push whenever the merged list differs from the remote list
    FullEquality,
}

impl FromStr for OfficeChangeDetection {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" | "length_only" => Ok(Self::LengthOnly),
            "full" | "full_equality" => Ok(Self::FullEquality),
            other => Err(SyncError::Config(format!(
                "Unknown office change detection mode: {other}"
            ))),
        }
    }
}

/// Sync configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Record server base URL
    pub server_url: String,
    /// Bearer token attached to every request
    pub auth_token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub office_detection: OfficeChangeDetection,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:4000".to_string(),
            auth_token: None,
            timeout_secs: 30,
            office_detection: OfficeChangeDetection::LengthOnly,
        }
    }
}

impl SyncConfig {
    /// Load from `MYDESK_SERVER_URL`, `MYDESK_TOKEN`, `MYDESK_HTTP_TIMEOUT_SECS`
    /// and `MYDESK_OFFICE_DETECTION`
    pub fn from_env() -> SyncResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("MYDESK_SERVER_URL") {
            config.server_url = url;
        }

        config.auth_token = std::env::var("MYDESK_TOKEN").ok().filter(|t| !t.is_empty());

        if let Ok(timeout) = std::env::var("MYDESK_HTTP_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                SyncError::Config(format!("MYDESK_HTTP_TIMEOUT_SECS is not a number: {timeout}"))
            })?;
        }

        if let Ok(mode) = std::env::var("MYDESK_OFFICE_DETECTION") {
            config.office_detection = mode.parse()?;
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}
