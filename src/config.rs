use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct MstoreConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_transactions_dir")]
    pub transactions_dir: PathBuf,
    /// Treat a missing account file as an empty store instead of an error
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Empty string logs to stderr
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("account.txt")
}

fn default_transactions_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "mstore.log".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            transactions_dir: default_transactions_dir(),
            create_if_missing: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl MstoreConfig {
    /// Runs before logging is set up, so problems go to stderr directly.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                if let Err(e) = std::fs::write(path, s) {
                    eprintln!("Could not write default config to '{}': {}", path.display(), e);
                }
            }
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mstore-config-{}-{}", uuid::Uuid::new_v4(), name))
    }

    #[test]
    fn test_missing_config_writes_defaults() {
        let path = scratch_path("mstore.toml");
        let config = MstoreConfig::load_or_default(&path);
        assert_eq!(config, MstoreConfig::default());
        assert!(path.exists());

        let reloaded = MstoreConfig::load_or_default(&path);
        assert_eq!(reloaded, config);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let path = scratch_path("partial.toml");
        std::fs::write(&path, "[store]\npath = \"ledger.txt\"\n").unwrap();

        let config = MstoreConfig::load_or_default(&path);
        assert_eq!(config.store.path, PathBuf::from("ledger.txt"));
        assert!(config.store.create_if_missing);
        assert_eq!(config.logging.level, "info");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let path = scratch_path("broken.toml");
        std::fs::write(&path, "store = [[[").unwrap();

        assert_eq!(MstoreConfig::load_or_default(&path), MstoreConfig::default());
        std::fs::remove_file(&path).unwrap();
    }
}
