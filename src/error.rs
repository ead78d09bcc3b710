//! Shared error taxonomy for the IMU and GNSS acquisition paths.
//!
//! Parse errors never reach this type (see `gnss::nmea`); everything here is
//! a boundary-crossing failure a reader or producer loop must react to.

use thiserror::Error;

/// Error kinds shared by both reader variants.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A bounded wait elapsed with no event. Not an outage — the caller
    /// decides whether to retry, decimate, or close.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The upstream stream ended or was cancelled cooperatively.
    #[error("end of stream")]
    Eof,

    /// A non-recoverable I/O error from SPI/GPIO/serial/socket.
    #[error("hardware fault: {0}")]
    HardwareFault(#[from] std::io::Error),

    /// Setup-time failure: device ID mismatch, daemon refused connection, etc.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

pub type SensorResult<T> = Result<T, SensorError>;
