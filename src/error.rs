use thiserror::Error;

/// Errors surfaced by sensor transports and drivers.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Engine-level error taxonomy.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("session write failed: {0}")]
    Write(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid session state: {0}")]
    InvalidState(String),
}

impl From<DriverError> for AcquisitionError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Connection(msg) => AcquisitionError::Connection(msg),
            DriverError::Decode(msg) => AcquisitionError::Decode(msg),
        }
    }
}

impl AcquisitionError {
    /// Write failures are fatal to the active session; everything else is
    /// recoverable at some layer above.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, AcquisitionError::Write(_) | AcquisitionError::Io(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AcquisitionError>;
