//! Configuration management for PDF-Pile

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::annotations::DEFAULT_HISTORY_LIMIT;
use crate::session::ModePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `pdfs.json`
    pub data_dir: PathBuf,
    /// Directory PDFs are written to and served from
    pub upload_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the metadata file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pdfs.json")
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            upload_dir: data_dir.join("uploads"),
            data_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                max_upload_bytes: 100 * 1024 * 1024,
            },
            storage: StorageConfig::with_data_dir("./data"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("uploads"));

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3001".to_string())
                    .parse()
                    .unwrap_or(3001),
                max_upload_bytes: env::var("MAX_UPLOAD_MB")
                    .ok()
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(100)
                    * 1024
                    * 1024,
            },
            storage: StorageConfig {
                data_dir,
                upload_dir,
            },
        })
    }
}

/// Settings of a client view session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period before an autosave fires
    pub autosave_delay: Duration,
    /// Number of undo snapshots kept
    pub history_limit: usize,
    /// Mode behavior after a selection creates annotations
    pub mode_policy: ModePolicy,
    /// Local scroll position file; `None` disables scroll memory
    pub scroll_file: Option<PathBuf>,
    /// Delay of the second scroll restore attempt
    pub scroll_restore_retry: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_secs(1),
            history_limit: DEFAULT_HISTORY_LIMIT,
            mode_policy: ModePolicy::Sticky,
            scroll_file: None,
            scroll_restore_retry: Duration::from_millis(400),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.storage.db_path(), PathBuf::from("./data/pdfs.json"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("./data/uploads"));

        let session = SessionConfig::default();
        assert_eq!(session.autosave_delay, Duration::from_secs(1));
        assert_eq!(session.history_limit, 50);
        assert_eq!(session.mode_policy, ModePolicy::Sticky);
    }
}
