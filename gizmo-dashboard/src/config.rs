//! Dashboard configuration storage
//!
//! Settings are read from a JSON file; missing keys (or a missing file) fall
//! back to the defaults in [`crate::constants::defaults`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::defaults;
use crate::presentation::{PresentationConfig, SpinnerStyle};

/// Full dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// Loading spinner shown on busy cards
    pub loading_spinner: SpinnerStyle,
    /// Spinner width and height in pixels
    pub spinner_size: u32,
    /// Simulated work time of every node computation
    pub compute_delay_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::BIND_ADDRESS.to_string(),
            loading_spinner: SpinnerStyle::default(),
            spinner_size: defaults::SPINNER_SIZE,
            compute_delay_ms: defaults::COMPUTE_DELAY_MS,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from disk
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        serde_json::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save configuration to disk
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents).await?;

        log::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    pub fn compute_delay(&self) -> Duration {
        Duration::from_millis(self.compute_delay_ms)
    }

    pub fn presentation(&self) -> PresentationConfig {
        PresentationConfig {
            spinner: self.loading_spinner,
            spinner_size: self.spinner_size,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(serde_json::Error),
}
