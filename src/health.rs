use std::time::Duration;

/// Silence threshold for one background-polling driver.
#[derive(Debug, Clone, Copy)]
pub struct SensorHealth {
    pub name: &'static str,
    pub silence_threshold: Duration,
}

impl SensorHealth {
    pub fn new(name: &'static str, silence_threshold: Duration) -> Self {
        Self { name, silence_threshold }
    }

    /// A driver that has never produced data is not "silent": it may still
    /// be waiting for its first fix.
    pub fn is_silent(&self, age: Option<Duration>) -> bool {
        age.map(|a| a > self.silence_threshold).unwrap_or(false)
    }
}

/// Point-in-time health of the two threaded drivers.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub radio_age: Option<Duration>,
    pub radio_healthy: bool,
    pub position_age: Option<Duration>,
    pub position_healthy: bool,
}

/// Staleness watchdog over the drivers' latest-value slots. The aiming
/// sensor is read synchronously per tick, so only radio and position need
/// watching.
pub struct HealthMonitor {
    radio: SensorHealth,
    position: SensorHealth,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            // The SDR refreshes every millisecond; the RTK receiver can
            // legitimately go quiet for a few seconds between fixes.
            radio: SensorHealth::new("radio", Duration::from_secs(2)),
            position: SensorHealth::new("gps", Duration::from_secs(10)),
        }
    }

    pub fn assess(&self, radio_age: Option<Duration>, position_age: Option<Duration>) -> HealthReport {
        HealthReport {
            radio_age,
            radio_healthy: !self.radio.is_silent(radio_age),
            position_age,
            position_healthy: !self.position.is_silent(position_age),
        }
    }

    /// One log-friendly line, in the style of the periodic status print.
    pub fn format_status(&self, report: &HealthReport) -> String {
        fn part(name: &str, healthy: bool, age: Option<Duration>) -> String {
            match (healthy, age) {
                (true, _) => format!("{name} ok"),
                (false, Some(age)) => format!("{name} silent {:.1}s", age.as_secs_f64()),
                (false, None) => format!("{name} no data"),
            }
        }
        format!(
            "{} | {}",
            part(self.radio.name, report.radio_healthy, report.radio_age),
            part(self.position.name, report.position_healthy, report.position_age),
        )
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
