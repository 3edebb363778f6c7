use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
    /// Served under `/public`; uploads and results go to its `uploads` subdirectory.
    pub public_dir: PathBuf,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            public_dir: PathBuf::from("public"),
            log_json: true,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from `PORT`, `ROLLUP_BIND_HOST`, `ROLLUP_PUBLIC_DIR` and
    /// `ROLLUP_LOG_JSON`, falling back to defaults for unset or blank variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(host) = get("ROLLUP_BIND_HOST") {
            config.bind_host = host.trim().to_string();
        }
        if let Some(dir) = get("ROLLUP_PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("ROLLUP_LOG_JSON") {
            config.log_json = parse_bool(raw.trim()).ok_or(ConfigError::InvalidValue {
                name: "ROLLUP_LOG_JSON",
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join("uploads")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}
