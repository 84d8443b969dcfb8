//! Node configuration.
//!
//! Resolution order, lowest to highest: built-in defaults, the TOML file,
//! then command-line flags and their environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = ".assetledger";

/// Name of the config file `init` writes into the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Subdirectory of the data directory holding the sled database.
pub const DB_DIR_NAME: &str = "db";

/// Node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Data directory; the world state lives in `<data_dir>/db`.
    pub data_dir: PathBuf,

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Flush sled after every committed transaction.
    pub flush_on_commit: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            flush_on_commit: true,
        }
    }
}

impl NodeConfig {
    /// Load from file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Resolve the effective configuration.
    ///
    /// Without an explicit `config_path`, `config.toml` inside the data
    /// directory is read when it exists.
    pub fn resolve(
        config_path: Option<&Path>,
        data_dir: Option<&Path>,
        log_format: Option<&str>,
    ) -> Result<Self> {
        let implicit = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
            .join(CONFIG_FILE_NAME);

        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None if implicit.is_file() => Self::from_file(&implicit)?,
            None => Self::default(),
        };

        if let Some(dir) = data_dir {
            config.data_dir = dir.to_path_buf();
        }
        if let Some(format) = log_format {
            config.log_format = format.to_string();
        }
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }

    /// Directory of the sled database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig::resolve(None, Some(dir.path()), None).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.log_level, "info");
        assert!(config.flush_on_commit);
        assert_eq!(config.db_path(), dir.path().join("db"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "log_format = \"json\"\nflush_on_commit = false\n").unwrap();

        let config = NodeConfig::from_file(&path).unwrap();
        assert_eq!(config.log_format, "json");
        assert!(!config.flush_on_commit);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "data_dir = \"/var/lib/ledger\"\nlog_format = \"json\"\n").unwrap();

        let config =
            NodeConfig::resolve(Some(&path), Some(Path::new("/tmp/other")), Some("pretty")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/other"));
        assert_eq!(config.log_format, "pretty");
    }

    #[test]
    fn implicit_config_in_data_dir_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let written = NodeConfig {
            data_dir: dir.path().to_path_buf(),
            log_level: "debug".into(),
            ..NodeConfig::default()
        };
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), written.to_toml().unwrap()).unwrap();

        let config = NodeConfig::resolve(None, Some(dir.path()), None).unwrap();
        assert_eq!(config, written);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "flush_on_commit = \"sometimes\"").unwrap();
        assert!(NodeConfig::from_file(&path).is_err());
    }
}
