use log::debug;

use crate::config::SerialConfig;
use crate::drivers::OrientationLink;
use crate::error::{AcquisitionError, Result};
use crate::readings::OrientationReading;

/// Aiming sensor driver. Unlike radio and position, the line rate of the
/// aiming head is well below the tick rate, so the contract is a synchronous
/// read per call with no background thread.
pub struct OrientationSensor {
    link: Option<Box<dyn OrientationLink>>,
    label: String,
}

impl OrientationSensor {
    pub fn connect(config: &SerialConfig, link: Box<dyn OrientationLink>) -> Result<Self> {
        debug!("aiming: opened {} @ {}", config.port, config.baudrate);
        Ok(Self { link: Some(link), label: "aiming (sync)".to_string() })
    }

    /// Read and decode one line. A malformed line surfaces as a decode
    /// error; the aggregator substitutes the sentinel and carries on.
    pub fn poll(&mut self) -> Result<OrientationReading> {
        match self.link.as_mut() {
            Some(link) => Ok(link.read_line()?),
            None => Err(AcquisitionError::Connection("aiming sensor disconnected".to_string())),
        }
    }

    pub fn thread_label(&self) -> &str {
        &self.label
    }

    /// Release the transport. Idempotent; there is no thread to join.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.link.take().is_some() {
            debug!("aiming: transport released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct ScriptedLine(Vec<std::result::Result<OrientationReading, DriverError>>);

    impl OrientationLink for ScriptedLine {
        fn read_line(&mut self) -> std::result::Result<OrientationReading, DriverError> {
            if self.0.is_empty() {
                Ok(OrientationReading::default())
            } else {
                self.0.remove(0)
            }
        }
    }

    #[test]
    fn test_poll_propagates_decode_errors() {
        let config = crate::config::Config::default().orientation;
        let script = vec![
            Ok(OrientationReading::new(90.0, 1.0, -1.0, 3, 25.0)),
            Err(DriverError::Decode("short line".into())),
        ];
        let mut sensor = OrientationSensor::connect(&config, Box::new(ScriptedLine(script))).unwrap();
        assert_eq!(sensor.poll().unwrap().bearing_deg, 90.0);
        assert!(matches!(sensor.poll(), Err(AcquisitionError::Decode(_))));
    }

    #[test]
    fn test_disconnect_idempotent() {
        let config = crate::config::Config::default().orientation;
        let mut sensor =
            OrientationSensor::connect(&config, Box::new(ScriptedLine(Vec::new()))).unwrap();
        sensor.disconnect().unwrap();
        sensor.disconnect().unwrap();
        assert!(sensor.poll().is_err());
    }
}
