//! Server configuration
//!
//! Defaults, then environment variables (`.env` is loaded by `main`), then
//! command-line overrides applied by the binary.

use error_common::{DeskError, Result};
use std::path::PathBuf;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    pub port: u16,
    /// Root of all persisted data (`profile/` next to the binary by default)
    pub data_dir: PathBuf,
    /// Inward attachments and `inward.json`; `<data_dir>/inward` when unset
    pub inward_dir: Option<PathBuf>,
    /// Outward attachments and `outward.json`; `<data_dir>/outward` when unset
    pub outward_dir: Option<PathBuf>,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Request body limit, attachments arrive inline as base64
    pub max_body_bytes: usize,
    /// Previous data location with `Inward/` and `Outward/` registers to import
    pub legacy_base_dir: Option<PathBuf>,
    /// Delete imported legacy files once the destination holds them
    pub cleanup_legacy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            data_dir: PathBuf::from("./profile"),
            inward_dir: None,
            outward_dir: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 168,
            max_body_bytes: 25 * 1024 * 1024,
            legacy_base_dir: None,
            cleanup_legacy: false,
        }
    }
}

impl ServerConfig {
    /// Load from `MYDESK_HOST`, `PORT`, `MYDESK_DATA_DIR`, `INWARD_DIR`,
    /// `OUTWARD_DIR`, `MYDESK_JWT_SECRET`, `MYDESK_TOKEN_TTL_HOURS`,
    /// `MYDESK_MAX_BODY_BYTES`, `MYDESK_LEGACY_BASE_DIR` and
    /// `MYDESK_CLEANUP_LEGACY` (`1` enables)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MYDESK_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_env("PORT")? {
            config.port = port;
        }
        if let Ok(dir) = std::env::var("MYDESK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.inward_dir = std::env::var("INWARD_DIR").ok().map(PathBuf::from);
        config.outward_dir = std::env::var("OUTWARD_DIR").ok().map(PathBuf::from);
        if let Ok(secret) = std::env::var("MYDESK_JWT_SECRET") {
            config.jwt_secret = secret;
        }
        if let Some(hours) = parse_env("MYDESK_TOKEN_TTL_HOURS")? {
            config.token_ttl_hours = hours;
        }
        if let Some(bytes) = parse_env("MYDESK_MAX_BODY_BYTES")? {
            config.max_body_bytes = bytes;
        }
        config.legacy_base_dir = std::env::var("MYDESK_LEGACY_BASE_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        config.cleanup_legacy = std::env::var("MYDESK_CLEANUP_LEGACY").is_ok_and(|v| v.trim() == "1");

        if config.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("MYDESK_JWT_SECRET not set, using the development secret");
        }
        Ok(config)
    }

    /// Config rooted at `data_dir` with defaults otherwise
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn inward_dir(&self) -> PathBuf {
        self.inward_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("inward"))
    }

    pub fn outward_dir(&self) -> PathBuf {
        self.outward_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("outward"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DeskError::ConfigError(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.inward_dir(), PathBuf::from("./profile/inward"));
        assert!(config.legacy_base_dir.is_none());
        assert!(!config.cleanup_legacy);
    }

    #[test]
    fn test_explicit_register_dirs() {
        let config = ServerConfig {
            outward_dir: Some(PathBuf::from("/srv/outward")),
            ..ServerConfig::with_data_dir("/srv/data")
        };
        assert_eq!(config.inward_dir(), PathBuf::from("/srv/data/inward"));
        assert_eq!(config.outward_dir(), PathBuf::from("/srv/outward"));
    }
}
