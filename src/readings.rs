use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the measurement CSV. Consumers branch on `PosType` to
/// interpret the first six numeric columns.
pub const MEASUREMENT_HEADER: [&str; 14] = [
    "Timestamp", "R_N/Lon", "R_E/Lat", "R_D/Hgt", "accN/hMSL", "accE/hAcc", "accD/vAcc",
    "PosType", "PowerRx", "Bearing", "Roll_XZ", "Pitch_YZ", "cal_stat_aim", "Temp",
];

/// Column order of the session metadata CSV.
pub const METADATA_HEADER: [&str; 7] = [
    "time_elapsed", "number_of_readings", "reading_rate", "time_per_reading",
    "usrp_rx_thread", "aiming_thread", "gps_thread",
];

/// GPS fix, tagged by the mode the receiver last reported.
///
/// Relative fixes are NED offsets from the RTK base station in centimeters;
/// absolute fixes are geodetic, heights in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PositionFix {
    Relative {
        north_cm: f64,
        east_cm: f64,
        down_cm: f64,
        acc_n_mm: f64,
        acc_e_mm: f64,
        acc_d_mm: f64,
    },
    Absolute {
        lon_deg: f64,
        lat_deg: f64,
        height_mm: f64,
        h_msl_mm: f64,
        h_acc_mm: f64,
        v_acc_mm: f64,
    },
}

impl PositionFix {
    /// Tag string written to the `PosType` column.
    pub fn pos_type(&self) -> &'static str {
        match self {
            PositionFix::Relative { .. } => "relPos",
            PositionFix::Absolute { .. } => "absPos",
        }
    }

    /// The six numeric columns, in file order.
    pub fn columns(&self) -> [f64; 6] {
        match *self {
            PositionFix::Relative { north_cm, east_cm, down_cm, acc_n_mm, acc_e_mm, acc_d_mm } => {
                [north_cm, east_cm, down_cm, acc_n_mm, acc_e_mm, acc_d_mm]
            }
            PositionFix::Absolute { lon_deg, lat_deg, height_mm, h_msl_mm, h_acc_mm, v_acc_mm } => {
                [lon_deg, lat_deg, height_mm, h_msl_mm, h_acc_mm, v_acc_mm]
            }
        }
    }
}

impl Default for PositionFix {
    /// Sentinel emitted before the receiver produces its first frame.
    fn default() -> Self {
        PositionFix::Relative {
            north_cm: 0.0,
            east_cm: 0.0,
            down_cm: 0.0,
            acc_n_mm: 0.0,
            acc_e_mm: 0.0,
            acc_d_mm: 0.0,
        }
    }
}

/// One decoded line from the aiming sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationReading {
    pub bearing_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    /// Magnetometer calibration status, 0 (uncalibrated) to 3 (fully calibrated).
    pub calibration_status: u8,
    pub temperature_c: f64,
}

impl OrientationReading {
    pub fn new(bearing_deg: f64, pitch_deg: f64, roll_deg: f64, calibration_status: u8, temperature_c: f64) -> Self {
        Self { bearing_deg, pitch_deg, roll_deg, calibration_status, temperature_c }
    }
}

impl Default for OrientationReading {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0, 0.0)
    }
}

/// One fused observation, assembled per tick from the three drivers'
/// most recent values. The timestamp is assigned at aggregation time, not
/// by the individual drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub timestamp: DateTime<Utc>,
    pub position: PositionFix,
    pub power_rx_dbm: f64,
    pub orientation: OrientationReading,
}

impl MeasurementRecord {
    /// Serialize in `MEASUREMENT_HEADER` order.
    pub fn csv_row(&self) -> Vec<String> {
        let pos = self.position.columns();
        let mut row = Vec::with_capacity(MEASUREMENT_HEADER.len());
        row.push(self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string());
        for value in pos {
            row.push(value.to_string());
        }
        row.push(self.position.pos_type().to_string());
        row.push(self.power_rx_dbm.to_string());
        row.push(self.orientation.bearing_deg.to_string());
        row.push(self.orientation.roll_deg.to_string());
        row.push(self.orientation.pitch_deg.to_string());
        row.push(self.orientation.calibration_status.to_string());
        row.push(self.orientation.temperature_c.to_string());
        row
    }
}

/// Final counters for one completed recording session, written as the single
/// metadata row at stop time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub elapsed_seconds: f64,
    pub reading_count: u64,
    pub reading_rate_hz: f64,
    pub avg_ms_per_reading: f64,
    pub radio_thread: String,
    pub orientation_thread: String,
    pub position_thread: String,
}

impl SessionSummary {
    /// Build from raw counters; rates are left at zero for an empty session
    /// (the recorder skips the metadata row in that case).
    pub fn from_counters(
        elapsed_seconds: f64,
        reading_count: u64,
        threads: [String; 3],
    ) -> Self {
        let (reading_rate_hz, avg_ms_per_reading) = if reading_count > 0 && elapsed_seconds > 0.0 {
            let rate = reading_count as f64 / elapsed_seconds;
            (rate, 1000.0 / rate)
        } else {
            (0.0, 0.0)
        };
        let [radio_thread, orientation_thread, position_thread] = threads;
        Self {
            elapsed_seconds,
            reading_count,
            reading_rate_hz,
            avg_ms_per_reading,
            radio_thread,
            orientation_thread,
            position_thread,
        }
    }

    /// Serialize in `METADATA_HEADER` order.
    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.elapsed_seconds.to_string(),
            self.reading_count.to_string(),
            self.reading_rate_hz.to_string(),
            self.avg_ms_per_reading.to_string(),
            self.radio_thread.clone(),
            self.orientation_thread.clone(),
            self.position_thread.clone(),
        ]
    }
}
