use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::error::Result;
use crate::readings::{MeasurementRecord, SessionSummary, MEASUREMENT_HEADER, METADATA_HEADER};

type CsvWriter = csv::Writer<BufWriter<File>>;

/// Owns the CSV lifecycle of one recording session: the measurement stream
/// and its parallel one-row metadata stream.
///
/// Files are created on first write, never at session begin, and the header
/// goes in exactly once per file — re-opening an existing file for append
/// leaves its header alone, so an interrupted session can be resumed.
pub struct SessionRecorder {
    measurement_path: PathBuf,
    metadata_path: PathBuf,
    writer: Option<CsvWriter>,
    rows_written: u64,
    finished: bool,
}

impl SessionRecorder {
    /// Derive the session file tree under `base_dir`:
    /// a day directory, a session directory named by date and time, and a
    /// `Metadata/` subdirectory. No CSV file is created yet.
    pub fn begin_session(base_dir: &Path, prefix: &str) -> Result<Self> {
        let now = Local::now();
        let day = now.format("%d-%m-%Y").to_string();
        let stamp = now.format("%d-%m-%Y-%H-%M-%S").to_string();

        let session_dir = base_dir
            .join(format!("{prefix}_MEAS_{day}"))
            .join(format!("{prefix}_MEAS_{stamp}"));
        let metadata_dir = session_dir.join("Metadata");
        std::fs::create_dir_all(&metadata_dir)?;

        let measurement_path = session_dir.join(format!("{prefix}_MEAS_{stamp}.csv"));
        let metadata_path = metadata_dir.join(format!("{prefix}_METADATA_{stamp}.csv"));
        info!("session files: {}", measurement_path.display());
        Ok(Self::resume(measurement_path, metadata_path))
    }

    /// Attach to explicit file paths, appending to whatever rows already
    /// exist there. Used to continue an interrupted session.
    pub fn resume(measurement_path: PathBuf, metadata_path: PathBuf) -> Self {
        Self {
            measurement_path,
            metadata_path,
            writer: None,
            rows_written: 0,
            finished: false,
        }
    }

    /// Append one record, writing the header first if this file is new.
    /// Flushes per row: durability wins over throughput at these rates.
    pub fn append(&mut self, record: &MeasurementRecord) -> Result<()> {
        if self.writer.is_none() {
            self.writer = Some(open_csv(&self.measurement_path, &MEASUREMENT_HEADER)?);
        }
        let writer = self.writer.as_mut().expect("writer opened above");
        writer.write_record(record.csv_row())?;
        writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Close the measurement stream and emit the single metadata row.
    /// An empty session writes no metadata at all. Calling this again is a
    /// no-op returning the same counter.
    pub fn end_session(&mut self, summary: &SessionSummary) -> Result<u64> {
        if self.finished {
            return Ok(self.rows_written);
        }
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        if summary.reading_count > 0 {
            let mut meta = open_csv(&self.metadata_path, &METADATA_HEADER)?;
            meta.write_record(summary.csv_row())?;
            meta.flush()?;
            info!(
                "session closed: {} readings in {:.1}s ({:.2} Hz)",
                summary.reading_count, summary.elapsed_seconds, summary.reading_rate_hz
            );
        } else {
            info!("session closed with no readings, metadata skipped");
        }
        self.finished = true;
        Ok(self.rows_written)
    }

    pub fn measurement_path(&self) -> &Path {
        &self.measurement_path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

/// Open for append, writing `header` only when the file did not exist
/// immediately before the open.
fn open_csv(path: &Path, header: &[&str]) -> Result<CsvWriter> {
    let exists = path.is_file();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    if !exists {
        writer.write_record(header)?;
        writer.flush()?;
    }
    Ok(writer)
}
