//! Server configuration loaded from a JSON file, with defaults when the
//! file is absent. CLI flags override individual fields at startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where per-account save files live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Optional mission definition file; the builtin missions run when it
    /// is not set.
    #[serde(default)]
    pub missions_file: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("cloud_saves")
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            missions_file: None,
        }
    }
}

impl ServerConfig {
    /// Read the config file, falling back to defaults when it does not
    /// exist. A present-but-malformed file is an error, not a fallback.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("malformed config file {path:?}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read config file {path:?}")),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
