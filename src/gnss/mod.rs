//! GNSS acquisition: NMEA parsing plus the two reader variants (serial,
//! daemon) sharing one public surface.

pub mod nmea;

mod daemon_reader;
mod serial_reader;
mod types;

pub use daemon_reader::{DaemonGnssReader, DaemonGnssReaderConfig};
pub use serial_reader::{SerialGnssReader, SerialGnssReaderConfig};
pub use types::{GgaData, GnssData, VtgData};

use crate::error::SensorResult;

/// Dispatches to whichever variant was opened, so producer code does not
/// need to match on the source when reading.
pub enum GnssReader {
    Serial(SerialGnssReader),
    Daemon(DaemonGnssReader),
}

pub enum GnssCanceller {
    Serial(serial_reader::GnssCanceller),
    Daemon(daemon_reader::GnssCanceller),
}

impl GnssCanceller {
    pub fn cancel(&self) {
        match self {
            GnssCanceller::Serial(c) => c.cancel(),
            GnssCanceller::Daemon(c) => c.cancel(),
        }
    }
}

impl GnssReader {
    pub fn read(&mut self) -> SensorResult<GnssData> {
        match self {
            GnssReader::Serial(r) => r.read(),
            GnssReader::Daemon(r) => r.read(),
        }
    }

    pub fn canceller(&self) -> GnssCanceller {
        match self {
            GnssReader::Serial(r) => GnssCanceller::Serial(r.canceller()),
            GnssReader::Daemon(r) => GnssCanceller::Daemon(r.canceller()),
        }
    }

    pub fn iter(&mut self) -> GnssIter<'_> {
        GnssIter { reader: self }
    }
}

pub struct GnssIter<'a> {
    reader: &'a mut GnssReader,
}

impl<'a> Iterator for GnssIter<'a> {
    type Item = SensorResult<GnssData>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read() {
            Err(crate::error::SensorError::Eof) => None,
            other => Some(other),
        }
    }
}
