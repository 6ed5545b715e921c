use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Serial transport parameters for the UBX receiver and the aiming sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
}

/// Receive-side radio parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    pub center_freq_hz: f64,
    pub rx_gain_db: f64,
}

/// Engine configuration, loadable from JSON and overridable from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub radio: RadioConfig,
    pub position: SerialConfig,
    pub orientation: SerialConfig,
    /// Aggregation cadence, ticks per second.
    pub tick_hz: f64,
    pub output_dir: String,
    pub file_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radio: RadioConfig { center_freq_hz: 500e6, rx_gain_db: 24.7 },
            position: SerialConfig { port: "/dev/ttyACM0".to_string(), baudrate: 19200 },
            orientation: SerialConfig { port: "/dev/ttyACM1".to_string(), baudrate: 19200 },
            tick_hz: 10.0,
            output_dir: "Data/5G_loss".to_string(),
            file_prefix: "5G_loss".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| crate::error::AcquisitionError::InvalidState(format!(
                "bad config {}: {e}",
                path.display()
            )))?;
        Ok(config)
    }

    /// Tick period derived from `tick_hz`, clamped away from zero.
    pub fn tick_period(&self) -> std::time::Duration {
        let hz = if self.tick_hz > 0.0 { self.tick_hz } else { 10.0 };
        std::time::Duration::from_secs_f64(1.0 / hz)
    }
}
