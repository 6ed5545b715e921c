use std::time::Duration;

use log::{debug, warn};

use crate::config::SerialConfig;
use crate::drivers::{LatestSlot, PollThread, PositionLink};
use crate::error::Result;
use crate::readings::PositionFix;

/// RTK messages arrive at the receiver's own cadence; 5 ms between reads
/// keeps the slot fresh without spinning on an idle serial line.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// RTK-GPS driver. The background thread drains decoded fixes from the link
/// into the latest-fix slot; the fix carries its own relative/absolute tag.
pub struct PositionSensor {
    slot: LatestSlot<PositionFix>,
    thread: Option<PollThread>,
    label: String,
}

impl PositionSensor {
    pub fn connect(config: &SerialConfig, mut link: Box<dyn PositionLink>) -> Result<Self> {
        debug!("gps: starting polling on {} @ {}", config.port, config.baudrate);
        let slot = LatestSlot::new();
        let writer = slot.clone();
        let thread = PollThread::spawn("gps-rx", POLL_INTERVAL, move || match link.read_fix() {
            Ok(Some(fix)) => writer.store(fix),
            Ok(None) => {}
            Err(err) => warn!("gps: dropped message: {err}"),
        })?;
        let label = thread.label().to_string();
        Ok(Self { slot, thread: Some(thread), label })
    }

    /// Most recent fix, sentinel (zeroed relative) until the first message
    /// decodes.
    pub fn poll(&self) -> PositionFix {
        self.slot.load().unwrap_or_default()
    }

    pub fn staleness(&self) -> Option<Duration> {
        self.slot.age()
    }

    pub fn thread_label(&self) -> &str {
        &self.label
    }

    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(mut thread) = self.thread.take() {
            thread.stop_and_join()?;
            debug!("gps: polling stopped");
        }
        Ok(())
    }
}

impl Drop for PositionSensor {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct OneFixLink {
        sent: bool,
    }

    impl PositionLink for OneFixLink {
        fn read_fix(&mut self) -> std::result::Result<Option<PositionFix>, DriverError> {
            if self.sent {
                return Ok(None);
            }
            self.sent = true;
            Ok(Some(PositionFix::Absolute {
                lon_deg: -74.0,
                lat_deg: 4.6,
                height_mm: 2_600_000.0,
                h_msl_mm: 2_570_000.0,
                h_acc_mm: 100.0,
                v_acc_mm: 150.0,
            }))
        }
    }

    #[test]
    fn test_sentinel_then_latest_fix() {
        let config = crate::config::Config::default().position;
        let mut gps = PositionSensor::connect(&config, Box::new(OneFixLink { sent: false })).unwrap();
        // Sentinel may be observed before the thread's first pass; after a
        // short wait the absolute fix must be in the slot.
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(gps.poll().pos_type(), "absPos");
        gps.disconnect().unwrap();
        gps.disconnect().unwrap();
    }
}
