use chrono::Utc;
use log::warn;

use crate::drivers::orientation::OrientationSensor;
use crate::drivers::position::PositionSensor;
use crate::drivers::radio::RadioReceiver;
use crate::readings::MeasurementRecord;

/// Fuse the three drivers' most recent values into one record.
///
/// Each driver is polled exactly once and never waited on; the wall-clock
/// stamp is taken here so all three fields share one capture instant. A
/// malfunctioning aiming sensor degrades its own field to the sentinel
/// rather than halting acquisition of the other two.
pub fn capture_record(
    radio: &RadioReceiver,
    position: &PositionSensor,
    orientation: &mut OrientationSensor,
) -> MeasurementRecord {
    let timestamp = Utc::now();
    let power_rx_dbm = radio.poll();
    let fix = position.poll();
    let aim = match orientation.poll() {
        Ok(reading) => reading,
        Err(err) => {
            warn!("aggregator: aiming read failed, substituting sentinel: {err}");
            Default::default()
        }
    };
    MeasurementRecord {
        timestamp,
        position: fix,
        power_rx_dbm,
        orientation: aim,
    }
}
