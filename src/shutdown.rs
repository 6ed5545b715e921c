use std::fmt;

use log::{error, info};

use crate::drivers::orientation::OrientationSensor;
use crate::drivers::position::PositionSensor;
use crate::drivers::radio::RadioReceiver;
use crate::error::AcquisitionError;

/// Outcome of a teardown pass: every driver was attempted, failures are
/// collected here instead of aborting the sequence.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    failures: Vec<(&'static str, AcquisitionError)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[(&'static str, AcquisitionError)] {
        &self.failures
    }

    fn record(&mut self, driver: &'static str, result: crate::error::Result<()>) {
        if let Err(err) = result {
            error!("shutdown: {driver} failed to close: {err}");
            self.failures.push((driver, err));
        }
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "all drivers closed cleanly");
        }
        write!(f, "{} driver(s) failed to close:", self.failures.len())?;
        for (driver, err) in &self.failures {
            write!(f, " [{driver}: {err}]")?;
        }
        Ok(())
    }
}

/// Close all three drivers in a fixed order, best effort. Each disconnect
/// joins its polling thread before the transport is released, so no
/// detached thread outlives this call.
pub fn shutdown_drivers(
    radio: &mut RadioReceiver,
    orientation: &mut OrientationSensor,
    position: &mut PositionSensor,
) -> ShutdownReport {
    info!(
        "shutting down drivers: {} / {} / {}",
        radio.thread_label(),
        orientation.thread_label(),
        position.thread_label()
    );
    let mut report = ShutdownReport::default();
    report.record("radio", radio.disconnect());
    report.record("aiming", orientation.disconnect());
    report.record("gps", position.disconnect());
    report
}
