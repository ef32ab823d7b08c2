//! Player settings, persisted as JSON.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::Path;

use crate::core::playback::DEFAULT_TICK_INTERVAL_MS;

/// Player settings
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    // Playback
    pub tick_interval_ms: u64, // Scheduler period (default 33 ≈ 30 fps)
    pub autoplay: bool,        // Start playing right after init
    pub looping: bool,         // Loop mode at construction

    // Workers
    pub workers_override: usize, // 0 = auto (3/4 of cores), N = override
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            autoplay: false,
            looping: false,
            workers_override: 0,
        }
    }
}

impl PlayerConfig {
    /// Read settings from a JSON file. Missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.sanitize();
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Worker thread count after applying the override
    pub fn worker_threads(&self) -> usize {
        if self.workers_override > 0 {
            self.workers_override
        } else {
            (num_cpus::get() * 3 / 4).max(1)
        }
    }

    fn sanitize(&mut self) {
        if self.tick_interval_ms == 0 {
            warn!(
                "tick_interval_ms must be positive, using {}",
                DEFAULT_TICK_INTERVAL_MS
            );
            self.tick_interval_ms = DEFAULT_TICK_INTERVAL_MS;
        }
    }
}
