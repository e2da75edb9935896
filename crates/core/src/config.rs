use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::mime::MIME_TEXT;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Formats the clipboard buffer is monitored for.
    pub formats: Vec<String>,
    pub monitor_clipboard: bool,
    pub monitor_selection: bool,
    pub min_check_again_ms: u64,
    pub max_check_again_ms: u64,
    pub max_retry_count: u32,
    /// Upper bound for a single selection conversion roundtrip.
    pub read_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            formats: vec![MIME_TEXT.to_string()],
            monitor_clipboard: true,
            monitor_selection: true,
            min_check_again_ms: 50,
            max_check_again_ms: 500,
            max_retry_count: 3,
            read_timeout_ms: 100,
        }
    }
}

impl MonitorConfig {
    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn min_check_again(&self) -> Duration {
        Duration::from_millis(self.min_check_again_ms)
    }

    pub fn max_check_again(&self) -> Duration {
        Duration::from_millis(self.max_check_again_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
