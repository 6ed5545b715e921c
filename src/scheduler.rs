use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::aggregator;
use crate::config::Config;
use crate::drivers::orientation::OrientationSensor;
use crate::drivers::position::PositionSensor;
use crate::drivers::radio::RadioReceiver;
use crate::drivers::LinkProvider;
use crate::error::{AcquisitionError, Result};
use crate::health::HealthMonitor;
use crate::live_status::LiveStatus;
use crate::operator::{OperatorCommand, OperatorControl};
use crate::readings::{MeasurementRecord, SessionSummary};
use crate::recorder::SessionRecorder;
use crate::shutdown::{shutdown_drivers, ShutdownReport};

/// Scheduler state machine.
///
/// ```text
/// Disconnected --connect_all----> Connected
/// Connected    --start_recording-> Recording
/// Recording    --pause-----------> Paused
/// Paused       --resume----------> Recording
/// Recording/Paused --stop--------> Connected   (session finalized)
/// Connected    --disconnect_all--> Disconnected
/// any          --fatal error-----> Disconnected (forced)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    Connected,
    Recording,
    Paused,
}

/// The three drivers, created at connect and destroyed only at disconnect.
/// They outlive individual recording sessions.
struct DriverSet {
    radio: RadioReceiver,
    position: PositionSensor,
    orientation: OrientationSensor,
}

impl DriverSet {
    fn thread_labels(&self) -> [String; 3] {
        [
            self.radio.thread_label().to_string(),
            self.orientation.thread_label().to_string(),
            self.position.thread_label().to_string(),
        ]
    }
}

/// Per-session bookkeeping, reset every time a new session begins.
struct ActiveSession {
    recorder: SessionRecorder,
    started: Instant,
    count: u64,
    window_start: Instant,
    window_count: u64,
    rate_hz: f64,
}

impl ActiveSession {
    fn summarize(&self, threads: [String; 3]) -> SessionSummary {
        SessionSummary::from_counters(self.started.elapsed().as_secs_f64(), self.count, threads)
    }
}

/// Drives the fixed-cadence acquisition cycle and owns the drivers, the
/// recorder, and the state machine. This is the composition root of the
/// engine: nothing else holds a sensor.
pub struct AcquisitionScheduler {
    config: Config,
    drivers: Option<DriverSet>,
    session: Option<ActiveSession>,
    state: SessionState,
    health: HealthMonitor,
    last_record: Option<MeasurementRecord>,
    last_summary: Option<SessionSummary>,
    connected_at: Option<Instant>,
}

impl AcquisitionScheduler {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            drivers: None,
            session: None,
            state: SessionState::Disconnected,
            health: HealthMonitor::new(),
            last_record: None,
            last_summary: None,
            connected_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Readings captured by the current session, 0 when idle.
    pub fn reading_count(&self) -> u64 {
        self.session.as_ref().map(|s| s.count).unwrap_or(0)
    }

    /// Rolling rate, recomputed from count and time deltas about once per
    /// second of wall time.
    pub fn reading_rate_hz(&self) -> f64 {
        self.session.as_ref().map(|s| s.rate_hz).unwrap_or(0.0)
    }

    pub fn session_measurement_path(&self) -> Option<PathBuf> {
        self.session
            .as_ref()
            .map(|s| s.recorder.measurement_path().to_path_buf())
    }

    /// Open all three transports and spawn the polling threads. Any single
    /// failure leaves the engine `Disconnected`; already-started drivers
    /// are torn down by their own teardown on drop.
    pub fn connect_all(&mut self, links: &mut dyn LinkProvider) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(AcquisitionError::InvalidState(format!(
                "connect_all from {:?}",
                self.state
            )));
        }
        let radio_link = links.open_radio()?;
        let position_link = links.open_position()?;
        let orientation_link = links.open_orientation()?;

        let radio = RadioReceiver::connect(&self.config.radio, radio_link)?;
        let position = PositionSensor::connect(&self.config.position, position_link)?;
        let orientation = OrientationSensor::connect(&self.config.orientation, orientation_link)?;

        self.drivers = Some(DriverSet { radio, position, orientation });
        self.connected_at = Some(Instant::now());
        self.state = SessionState::Connected;
        info!("all sensors connected");
        Ok(())
    }

    /// Begin a session: derive the file tree, reset counters, enter
    /// `Recording`. The drivers are untouched — they were already polling.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(AcquisitionError::InvalidState(format!(
                "start_recording from {:?}",
                self.state
            )));
        }
        let recorder =
            SessionRecorder::begin_session(Path::new(&self.config.output_dir), &self.config.file_prefix)?;
        let now = Instant::now();
        self.session = Some(ActiveSession {
            recorder,
            started: now,
            count: 0,
            window_start: now,
            window_count: 0,
            rate_hz: 0.0,
        });
        self.state = SessionState::Recording;
        info!("recording started");
        Ok(())
    }

    /// Suspend appends without closing the file. Ticks during the pause are
    /// simply absent from the log; nothing is buffered or replayed.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != SessionState::Recording {
            return Err(AcquisitionError::InvalidState(format!("pause from {:?}", self.state)));
        }
        self.state = SessionState::Paused;
        info!("recording paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != SessionState::Paused {
            return Err(AcquisitionError::InvalidState(format!("resume from {:?}", self.state)));
        }
        self.state = SessionState::Recording;
        info!("recording resumed");
        Ok(())
    }

    /// Finalize the session and return to `Connected`. Sensor connections
    /// persist; only the file handles and counters are gone.
    pub fn stop(&mut self) -> Result<SessionSummary> {
        if !matches!(self.state, SessionState::Recording | SessionState::Paused) {
            return Err(AcquisitionError::InvalidState(format!("stop from {:?}", self.state)));
        }
        let threads = self
            .drivers
            .as_ref()
            .map(DriverSet::thread_labels)
            .unwrap_or_default();
        let mut session = self.session.take().expect("recording implies a session");
        let summary = session.summarize(threads);
        self.state = SessionState::Connected;
        session.recorder.end_session(&summary)?;
        self.last_summary = Some(summary.clone());
        Ok(summary)
    }

    /// Counters from the most recently finalized session, if any.
    pub fn last_summary(&self) -> Option<&SessionSummary> {
        self.last_summary.as_ref()
    }

    /// One aggregation cycle. While `Recording` the record is appended and
    /// counted; while `Paused` or `Connected` it only refreshes the live
    /// view. A write failure is fatal: the session and drivers are torn
    /// down and the error propagates.
    pub fn tick(&mut self) -> Result<Option<MeasurementRecord>> {
        let drivers = match self.drivers.as_mut() {
            Some(drivers) => drivers,
            None => return Ok(None),
        };
        let record =
            aggregator::capture_record(&drivers.radio, &drivers.position, &mut drivers.orientation);
        self.last_record = Some(record.clone());

        if self.state == SessionState::Recording {
            let session = self.session.as_mut().expect("recording implies a session");
            if let Err(err) = session.recorder.append(&record) {
                error!("append failed, aborting session: {err}");
                let report = self.disconnect_all();
                if !report.is_clean() {
                    warn!("{report}");
                }
                return Err(err);
            }
            session.count += 1;

            let window = session.window_start.elapsed().as_secs_f64();
            if window >= 1.0 {
                session.rate_hz = (session.count - session.window_count) as f64 / window;
                session.window_start = Instant::now();
                session.window_count = session.count;
            }
        }
        Ok(Some(record))
    }

    /// Best-effort teardown from any state: close every driver in a fixed
    /// order collecting failures, then finalize a still-active session with
    /// whatever counters accumulated.
    pub fn disconnect_all(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if let Some(mut drivers) = self.drivers.take() {
            let threads = drivers.thread_labels();
            report = shutdown_drivers(&mut drivers.radio, &mut drivers.orientation, &mut drivers.position);
            if let Some(mut session) = self.session.take() {
                let summary = session.summarize(threads);
                if let Err(err) = session.recorder.end_session(&summary) {
                    error!("failed to finalize truncated session: {err}");
                }
                self.last_summary = Some(summary);
            }
        }
        self.connected_at = None;
        self.state = SessionState::Disconnected;
        report
    }

    /// Apply one operator command; invalid transitions are logged and
    /// dropped, never fatal. Returns true when the operator asked to
    /// disconnect and exit.
    pub fn handle_command(&mut self, command: OperatorCommand) -> bool {
        let result = match command {
            OperatorCommand::StartRecording => match self.state {
                // Enter doubles as resume in the keyboard surface.
                SessionState::Paused => self.resume(),
                _ => self.start_recording(),
            },
            OperatorCommand::Pause => self.pause(),
            OperatorCommand::Resume => self.resume(),
            OperatorCommand::Stop => self.stop().map(drop),
            OperatorCommand::Disconnect => return true,
        };
        if let Err(err) = result {
            warn!("operator command {command:?} rejected: {err}");
        }
        false
    }

    /// The driving loop: fixed cadence, operator commands drained once per
    /// tick, live status published about once a second. Returns after a
    /// disconnect request, an interrupt, or a fatal session error.
    pub fn run(&mut self, operator: &OperatorControl, interrupted: &AtomicBool) -> Result<()> {
        let period = self.config.tick_period();
        let mut next_tick = Instant::now() + period;
        let mut last_status = Instant::now();
        info!("acquisition loop running at {:.1} Hz", self.config.tick_hz);

        loop {
            if interrupted.load(Ordering::Relaxed) {
                info!("interrupt received, disconnecting");
                break;
            }
            let mut exit = false;
            while let Some(command) = operator.try_next() {
                if self.handle_command(command) {
                    exit = true;
                    break;
                }
            }
            if exit {
                break;
            }

            self.tick()?;

            if last_status.elapsed() >= Duration::from_secs(1) {
                self.publish_status();
                last_status = Instant::now();
            }

            let now = Instant::now();
            if next_tick > now {
                std::thread::sleep(next_tick - now);
            }
            next_tick += period;
            if next_tick < Instant::now() {
                // Fell behind (slow disk, slow sensor read): accept the
                // drift instead of bursting to catch up.
                next_tick = Instant::now() + period;
            }
        }

        let report = self.disconnect_all();
        if !report.is_clean() {
            warn!("{report}");
        }
        Ok(())
    }

    /// Snapshot for the display layer, written next to the session data.
    pub fn live_status(&self) -> LiveStatus {
        let mut status = LiveStatus::new(self.state);
        status.reading_count = self.reading_count();
        status.reading_rate_hz = self.reading_rate_hz();
        status.uptime_seconds = self
            .connected_at
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        if let Some(record) = &self.last_record {
            status.power_rx_dbm = record.power_rx_dbm;
            status.pos_type = record.position.pos_type().to_string();
            status.bearing_deg = record.orientation.bearing_deg;
            status.pitch_deg = record.orientation.pitch_deg;
            status.roll_deg = record.orientation.roll_deg;
        }
        if let Some(drivers) = &self.drivers {
            let report = self
                .health
                .assess(drivers.radio.staleness(), drivers.position.staleness());
            status.radio_healthy = report.radio_healthy;
            status.gps_healthy = report.position_healthy;
            status.radio_silence_secs =
                report.radio_age.map(|a| a.as_secs_f64()).unwrap_or(0.0);
            status.gps_silence_secs =
                report.position_age.map(|a| a.as_secs_f64()).unwrap_or(0.0);
        }
        status
    }

    fn publish_status(&self) {
        let status = self.live_status();
        if let Some(drivers) = &self.drivers {
            let report = self
                .health
                .assess(drivers.radio.staleness(), drivers.position.staleness());
            if !report.radio_healthy || !report.position_healthy {
                warn!("sensor health: {}", self.health.format_status(&report));
            }
        }
        let path = format!("{}/live_status.json", self.config.output_dir);
        if let Err(err) = status.save(&path) {
            warn!("live status write failed: {err}");
        }
    }
}
