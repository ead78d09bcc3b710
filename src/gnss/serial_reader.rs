//! Serial NMEA GNSS reader variant.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{SensorError, SensorResult};
use crate::gnss::nmea::{parse_gga, parse_vtg};
use crate::gnss::types::{GnssData, VtgData};

#[derive(Debug, Clone)]
pub struct SerialGnssReaderConfig {
    pub port_path: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

/// Shared cancellation flag. Calling `cancel()` from another thread causes
/// the in-progress or next blocking read to return `Eof` within one
/// timeout period — the serial port has no shutdown-on-demand primitive, so
/// a flag polled between reads is the closest analogue.
#[derive(Clone)]
pub struct GnssCanceller {
    cancelled: Arc<AtomicBool>,
}

impl GnssCanceller {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

pub struct SerialGnssReader {
    port: Box<dyn SerialPort>,
    cancelled: Arc<AtomicBool>,
    last_vtg: Option<VtgData>,
}

impl SerialGnssReader {
    pub fn open(config: &SerialGnssReaderConfig) -> SensorResult<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| {
                SensorError::ConfigurationError(format!(
                    "open {}: {e}",
                    config.port_path
                ))
            })?;

        Ok(Self {
            port,
            cancelled: Arc::new(AtomicBool::new(false)),
            last_vtg: None,
        })
    }

    pub fn canceller(&self) -> GnssCanceller {
        GnssCanceller {
            cancelled: self.cancelled.clone(),
        }
    }

    /// Reads lines until a GGA sentence is parsed, updating `last_vtg` on
    /// any VTG sentence seen along the way. A timed-out read and a true EOF
    /// are indistinguishable at this layer and both surface as `Eof`.
    pub fn read(&mut self) -> SensorResult<GnssData> {
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(SensorError::Eof);
            }

            let line = read_line(self.port.as_mut())?;

            if let Some(vtg) = parse_vtg(&line) {
                self.last_vtg = Some(vtg);
                continue;
            }
            if let Some(gga) = parse_gga(&line) {
                return Ok(GnssData {
                    gga,
                    vtg: self.last_vtg.clone(),
                });
            }
            // Any other sentence type, checksum failure, or malformed
            // line is silently discarded.
        }
    }

    pub fn iter(&mut self) -> SerialGnssIter<'_> {
        SerialGnssIter { reader: self }
    }
}

pub struct SerialGnssIter<'a> {
    reader: &'a mut SerialGnssReader,
}

impl<'a> Iterator for SerialGnssIter<'a> {
    type Item = SensorResult<GnssData>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read() {
            Err(SensorError::Eof) => None,
            other => Some(other),
        }
    }
}

/// Reads one CR/LF-terminated ASCII line. A read timeout with no bytes yet
/// accumulated, and a zero-byte read, both fail as `Eof` per the adopted
/// revision (see the reader module's design notes).
fn read_line(port: &mut dyn Read) -> SensorResult<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match port.read(&mut byte) {
            Ok(0) => return Err(SensorError::Eof),
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Err(SensorError::Eof),
            Err(e) => return Err(SensorError::HardwareFault(e)),
        }
    }
    while line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
