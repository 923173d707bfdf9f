//! Daemon configuration with TOML file support.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the Custodia daemon.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the API server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// How long a writer waits for the write slot before giving up
    /// with a retryable busy error, in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Path to a TOML currency catalog. Absent means the built-in table.
    #[serde(default)]
    pub currencies_file: Option<PathBuf>,

    /// Create a few demo users on startup so the API is usable without
    /// an external registration service.
    #[serde(default)]
    pub seed_demo_users: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        let config = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
        Ok(config)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            map_size_mb: default_map_size_mb(),
            write_timeout_ms: default_write_timeout_ms(),
            currencies_file: None,
            seed_demo_users: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./custodia_data")
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8090))
}

fn default_map_size_mb() -> usize {
    256
}

fn default_write_timeout_ms() -> u64 {
    2_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.listen_addr, default_listen_addr());
        assert_eq!(config.map_size_mb, 256);
        assert!(!config.seed_demo_users);
        assert!(config.currencies_file.is_none());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config: DaemonConfig = toml::from_str(
            r#"
            listen_addr = "0.0.0.0:9000"
            seed_demo_users = true
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000".parse().unwrap());
        assert!(config.seed_demo_users);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.data_dir, default_data_dir());
    }
}
