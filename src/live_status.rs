use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scheduler::SessionState;

/// Snapshot of the engine for the display layer, refreshed about once a
/// second while connected. The GUI reads this file; nothing in the engine
/// depends on it being consumed.
#[derive(Serialize, Deserialize, Clone)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub state: SessionState,
    pub reading_count: u64,
    pub reading_rate_hz: f64,
    pub uptime_seconds: u64,
    // Last fused record
    pub power_rx_dbm: f64,
    pub pos_type: String,
    pub bearing_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    // Driver health
    pub radio_healthy: bool,
    pub gps_healthy: bool,
    pub radio_silence_secs: f64,
    pub gps_silence_secs: f64,
}

impl LiveStatus {
    pub fn new(state: SessionState) -> Self {
        Self {
            timestamp: current_timestamp(),
            state,
            reading_count: 0,
            reading_rate_hz: 0.0,
            uptime_seconds: 0,
            power_rx_dbm: 0.0,
            pos_type: "relPos".to_string(),
            bearing_deg: 0.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
            radio_healthy: true,
            gps_healthy: true,
            radio_silence_secs: 0.0,
            gps_silence_secs: 0.0,
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
