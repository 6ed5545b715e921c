use std::time::Duration;

use log::{debug, warn};

use crate::config::RadioConfig;
use crate::drivers::{LatestSlot, PollThread, RadioLink};
use crate::error::Result;

/// How often the background thread asks the link for a fresh power sample.
/// The SDR produces frames far faster than the aggregation cadence, so this
/// only bounds staleness, not throughput.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// SDR receive-power driver. A background thread continuously refreshes the
/// latest-power slot; `poll` reads it without blocking.
pub struct RadioReceiver {
    slot: LatestSlot<f64>,
    thread: Option<PollThread>,
    label: String,
}

impl RadioReceiver {
    /// Take ownership of an opened link and start the polling thread.
    pub fn connect(config: &RadioConfig, mut link: Box<dyn RadioLink>) -> Result<Self> {
        debug!(
            "radio: starting rx polling at {:.1} MHz, gain {:.1} dB",
            config.center_freq_hz / 1e6,
            config.rx_gain_db
        );
        let slot = LatestSlot::new();
        let writer = slot.clone();
        let thread = PollThread::spawn("radio-rx", POLL_INTERVAL, move || {
            match link.sample_power_dbm() {
                Ok(power) => writer.store(power),
                // Transient decode glitches keep the previous value current.
                Err(err) => warn!("radio: dropped sample: {err}"),
            }
        })?;
        let label = thread.label().to_string();
        Ok(Self { slot, thread: Some(thread), label })
    }

    /// Most recent receive power in dBm, 0.0 until the first sample lands.
    pub fn poll(&self) -> f64 {
        self.slot.load().unwrap_or(0.0)
    }

    /// Time since the polling thread last stored a sample.
    pub fn staleness(&self) -> Option<Duration> {
        self.slot.age()
    }

    pub fn thread_label(&self) -> &str {
        &self.label
    }

    /// Stop the polling thread and join it. Safe to call again after a
    /// successful disconnect.
    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(mut thread) = self.thread.take() {
            thread.stop_and_join()?;
            debug!("radio: rx polling stopped");
        }
        Ok(())
    }
}

impl Drop for RadioReceiver {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}
