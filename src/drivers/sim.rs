//! Simulated transports, used by the binary until real hardware backends
//! are wired in. Waveforms are deterministic so recorded files are easy to
//! eyeball.

use std::f64::consts::PI;

use crate::drivers::{LinkProvider, OrientationLink, PositionLink, RadioLink};
use crate::error::DriverError;
use crate::readings::{OrientationReading, PositionFix};

/// Slow fade around a plausible field level.
pub struct SimRadioLink {
    seq: u64,
}

impl RadioLink for SimRadioLink {
    fn sample_power_dbm(&mut self) -> Result<f64, DriverError> {
        let t = self.seq as f64 * 0.001;
        self.seq += 1;
        Ok(-62.0 + (t * 2.0 * PI * 0.2).sin() * 4.0)
    }
}

/// Walks north-east in relative mode, reporting an absolute fix every
/// tenth message the way the receiver interleaves NAV-POSLLH.
pub struct SimPositionLink {
    seq: u64,
}

impl PositionLink for SimPositionLink {
    fn read_fix(&mut self) -> Result<Option<PositionFix>, DriverError> {
        let seq = self.seq;
        self.seq += 1;
        // The receiver does not emit a message on every poll.
        if seq % 3 != 0 {
            return Ok(None);
        }
        let step = seq as f64;
        if seq % 30 == 0 && seq > 0 {
            Ok(Some(PositionFix::Absolute {
                lon_deg: -74.0845 + step * 1e-7,
                lat_deg: 4.6386 + step * 1e-7,
                height_mm: 2_577_000.0,
                h_msl_mm: 2_551_000.0,
                h_acc_mm: 140.0,
                v_acc_mm: 210.0,
            }))
        } else {
            Ok(Some(PositionFix::Relative {
                north_cm: step * 1.5,
                east_cm: step * 0.8,
                down_cm: (step * 0.02).sin() * 3.0,
                acc_n_mm: 14.0,
                acc_e_mm: 14.0,
                acc_d_mm: 27.0,
            }))
        }
    }
}

/// Sweeps the bearing slowly with a fully calibrated magnetometer.
pub struct SimOrientationLink {
    seq: u64,
}

impl OrientationLink for SimOrientationLink {
    fn read_line(&mut self) -> Result<OrientationReading, DriverError> {
        let t = self.seq as f64 * 0.1;
        self.seq += 1;
        Ok(OrientationReading::new(
            (t * 3.0) % 360.0,
            (t * 0.5).sin() * 2.0,
            (t * 0.7).cos() * 1.5,
            3,
            26.5 + (t * 0.05).sin(),
        ))
    }
}

/// Hands out one simulated link per sensor.
pub struct SimLinkProvider;

impl LinkProvider for SimLinkProvider {
    fn open_radio(&mut self) -> Result<Box<dyn RadioLink>, DriverError> {
        Ok(Box::new(SimRadioLink { seq: 0 }))
    }

    fn open_position(&mut self) -> Result<Box<dyn PositionLink>, DriverError> {
        Ok(Box::new(SimPositionLink { seq: 0 }))
    }

    fn open_orientation(&mut self) -> Result<Box<dyn OrientationLink>, DriverError> {
        Ok(Box::new(SimOrientationLink { seq: 0 }))
    }
}
