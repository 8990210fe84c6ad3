//! Server configuration
//!
//! Settings come from `sqlbridge.toml` (optional), then `SQLBRIDGE_*`
//! environment variables, then command-line flags applied by the binary.
//!
//! ## Environment Variables
//!
//! - `SQLBRIDGE_HOST` - Bind address
//! - `SQLBRIDGE_PORT` - Listen port
//! - `SQLBRIDGE_MAX_ROWS` - Default max rows for new connections (0 = unlimited)
//! - `SQLBRIDGE_CHUNK_SIZE` - Rows per read when the client asks for 0
//!
//! These can be set in a `.env` file next to the configuration file.

use crate::service::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "sqlbridge.toml";

pub const ENV_HOST: &str = "SQLBRIDGE_HOST";
pub const ENV_PORT: &str = "SQLBRIDGE_PORT";
pub const ENV_MAX_ROWS: &str = "SQLBRIDGE_MAX_ROWS";
pub const ENV_CHUNK_SIZE: &str = "SQLBRIDGE_CHUNK_SIZE";

pub const DEFAULT_PORT: u16 = 7420;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Max rows applied to new connections that do not set their own
    pub max_rows: i32,
    /// Rows per read when the client does not choose
    pub chunk_size: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_rows: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BridgeConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// `sqlbridge.toml` in the working directory is read if present. A `.env`
    /// file beside the configuration is loaded first, and environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Configuration file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => {
                let p = Path::new(CONFIG_FILE_NAME);
                p.exists().then(|| p.to_path_buf())
            }
        };

        let env_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let env_path = env_dir.join(".env");
        if env_path.exists() {
            if let Err(e) = dotenvy::from_path(&env_path) {
                tracing::warn!("Failed to load {}: {}", env_path.display(), e);
            }
        }

        let mut config = match config_path {
            Some(p) => Self::from_toml(&std::fs::read_to_string(&p)?)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(ENV_HOST) {
            if !host.is_empty() {
                self.host = host;
            }
        }

        if let Some(port) = lookup(ENV_PORT).and_then(|v| v.parse::<u16>().ok()) {
            self.port = port;
        }

        if let Some(max_rows) = lookup(ENV_MAX_ROWS).and_then(|v| v.parse::<i32>().ok()) {
            self.max_rows = max_rows;
        }

        if let Some(chunk_size) = lookup(ENV_CHUNK_SIZE).and_then(|v| v.parse::<u32>().ok()) {
            self.chunk_size = chunk_size;
        }
    }

    /// Address the listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = BridgeConfig::from_toml("port = 9000\nmax_rows = 100\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_rows, 100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "0.0.0.0"),
            (ENV_PORT, "7500"),
            (ENV_MAX_ROWS, "not-a-number"),
            (ENV_CHUNK_SIZE, "64"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.bind_addr(), "0.0.0.0:7500");
        assert_eq!(config.max_rows, 0);
        assert_eq!(config.chunk_size, 64);
    }

    #[test]
    fn test_malformed_env_file_does_not_abort_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "chunk_size = 25\n").unwrap();
        std::fs::write(dir.path().join(".env"), "NOT A VALID LINE\n").unwrap();

        let config = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.chunk_size, 25);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "host = \"10.0.0.1\"\nchunk_size = 10\n").unwrap();

        let config = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.chunk_size, 10);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BridgeConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_serialization() {
        let toml_str = toml::to_string_pretty(&BridgeConfig::default()).unwrap();
        assert!(toml_str.contains("port = 7420"));
        assert!(toml_str.contains("host = \"127.0.0.1\""));
    }
}
