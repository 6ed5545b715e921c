//! Multi-sensor acquisition and logging engine for millimeter-wave
//! propagation surveys.
//!
//! Three independently-clocked sensors (SDR receive power, RTK-GPS
//! position, antenna aiming head) feed latest-value slots; a fixed-cadence
//! scheduler fuses them into timestamped records and appends them to a
//! per-session CSV, with pause/resume and clean teardown under operator
//! control. Curve fitting and plotting over the recorded files happen in
//! separate offline tooling.

pub mod aggregator;
pub mod config;
pub mod drivers;
pub mod error;
pub mod health;
pub mod live_status;
pub mod operator;
pub mod readings;
pub mod recorder;
pub mod scheduler;
pub mod shutdown;

pub use config::Config;
pub use error::{AcquisitionError, DriverError, Result};
pub use readings::{MeasurementRecord, OrientationReading, PositionFix, SessionSummary};
pub use scheduler::{AcquisitionScheduler, SessionState};
