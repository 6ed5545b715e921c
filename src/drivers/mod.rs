//! Sensor driver adapters.
//!
//! Each driver wraps one transport behind a uniform "poll the latest decoded
//! reading" surface. Radio and position run their own background polling
//! thread; the aiming sensor is read synchronously per call. Wire-protocol
//! decoding (UBX frames, SDR streaming, serial line framing) lives behind
//! the link traits and is not this crate's concern.

pub mod orientation;
pub mod position;
pub mod radio;
pub mod sim;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::DriverError;
use crate::readings::{OrientationReading, PositionFix};

/// Power sampling transport (SDR receive chain).
pub trait RadioLink: Send + 'static {
    /// Latest integrated receive power. Implementations should block at most
    /// for one frame period.
    fn sample_power_dbm(&mut self) -> Result<f64, DriverError>;
}

/// RTK receiver transport. `Ok(None)` means no message is pending;
/// implementations are expected to sleep a few milliseconds between
/// unsuccessful reads rather than spin.
pub trait PositionLink: Send + 'static {
    fn read_fix(&mut self) -> Result<Option<PositionFix>, DriverError>;
}

/// Aiming sensor transport, one decoded line per call.
pub trait OrientationLink: Send + 'static {
    fn read_line(&mut self) -> Result<OrientationReading, DriverError>;
}

/// Opens the three transports at connect time. The engine only sees this
/// factory; concrete hardware backends and the simulator both implement it.
pub trait LinkProvider {
    fn open_radio(&mut self) -> Result<Box<dyn RadioLink>, DriverError>;
    fn open_position(&mut self) -> Result<Box<dyn PositionLink>, DriverError>;
    fn open_orientation(&mut self) -> Result<Box<dyn OrientationLink>, DriverError>;
}

/// Last-value cell shared between one polling thread (writer) and the
/// aggregator (reader). Only last-write-wins semantics are required, so a
/// plain mutex around the value is enough.
#[derive(Clone)]
pub struct LatestSlot<T: Clone> {
    value: Arc<Mutex<Option<T>>>,
    updated_at: Arc<Mutex<Option<Instant>>>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
            updated_at: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self, value: T) {
        if let Ok(mut slot) = self.value.lock() {
            *slot = Some(value);
        }
        if let Ok(mut at) = self.updated_at.lock() {
            *at = Some(Instant::now());
        }
    }

    /// Most recent value, if any has arrived yet. Never blocks beyond the
    /// slot mutex, which the writer holds only for the assignment.
    pub fn load(&self) -> Option<T> {
        self.value.lock().ok().and_then(|slot| slot.clone())
    }

    /// Time since the writer last refreshed the slot.
    pub fn age(&self) -> Option<Duration> {
        self.updated_at
            .lock()
            .ok()
            .and_then(|at| at.map(|t| t.elapsed()))
    }
}

impl<T: Clone> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A named background polling thread with cooperative stop and a guaranteed
/// join. `stop_and_join` is safe to call more than once.
pub struct PollThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    label: String,
}

impl PollThread {
    /// Spawn `step` at `interval` until stopped.
    pub fn spawn<F>(name: &str, interval: Duration, mut step: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    step();
                    std::thread::sleep(interval);
                }
            })?;
        let label = format!("{} ({:?})", name, handle.thread().id());
        Ok(Self { stop, handle: Some(handle), label })
    }

    /// Diagnostic identifier recorded in session metadata.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Signal the loop to stop and block until the thread has exited.
    pub fn stop_and_join(&mut self) -> Result<(), DriverError> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| DriverError::Connection("polling thread panicked".to_string()))?;
        }
        Ok(())
    }
}
