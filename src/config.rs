use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::qr::RenderOptions;

/// Media server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory that generated QR images are written to
    #[serde(default = "default_qr_dir")]
    pub qr_dir: PathBuf,

    /// Visual parameters shared by every QR render
    #[serde(default)]
    pub render: RenderOptions,
}

fn default_qr_dir() -> PathBuf {
    PathBuf::from("qrcodes")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qr_dir: default_qr_dir(),
            render: RenderOptions::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
