//! GNSS daemon (gpsd-like) JSON reader variant: TCP, newline-delimited JSON.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{SensorError, SensorResult};
use crate::gnss::types::{GgaData, GnssData, VtgData};

#[derive(Debug, Clone)]
pub struct DaemonGnssReaderConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
}

#[derive(Debug, Clone, Default)]
struct SkyState {
    num_satellites: Option<i32>,
    hdop: Option<f64>,
}

#[derive(Clone)]
pub struct GnssCanceller {
    cancelled: Arc<AtomicBool>,
    stream: Arc<TcpStream>,
}

impl GnssCanceller {
    /// Sets the cancellation flag and half-closes the socket so a blocked
    /// read unblocks immediately rather than waiting for the next timeout.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

pub struct DaemonGnssReader {
    stream: Arc<TcpStream>,
    cancelled: Arc<AtomicBool>,
    sky: SkyState,
}

impl DaemonGnssReader {
    pub fn open(config: &DaemonGnssReaderConfig) -> SensorResult<Self> {
        let stream = TcpStream::connect((config.host.as_str(), config.port)).map_err(|e| {
            SensorError::ConfigurationError(format!(
                "connect {}:{}: {e}",
                config.host, config.port
            ))
        })?;
        stream
            .set_read_timeout(Some(config.read_timeout))
            .map_err(|e| SensorError::ConfigurationError(format!("set read timeout: {e}")))?;

        let mut stream = stream;
        if let Err(e) = stream.write_all(b"?WATCH={\"enable\":true,\"json\":true}\n") {
            let _ = stream.shutdown(Shutdown::Both);
            return Err(SensorError::ConfigurationError(format!(
                "send WATCH command: {e}"
            )));
        }

        Ok(Self {
            stream: Arc::new(stream),
            cancelled: Arc::new(AtomicBool::new(false)),
            sky: SkyState::default(),
        })
    }

    pub fn canceller(&self) -> GnssCanceller {
        GnssCanceller {
            cancelled: self.cancelled.clone(),
            stream: self.stream.clone(),
        }
    }

    /// Reads and classifies daemon messages until a `TPV` produces a
    /// combined sample. Socket read timeouts return to the top of the loop
    /// rather than failing; connection closure fails with `Eof`.
    pub fn read(&mut self) -> SensorResult<GnssData> {
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(SensorError::Eof);
            }

            let line = match read_line(self.stream.as_ref(), &self.cancelled)? {
                None => continue,
                Some(line) => line,
            };

            let Ok(value) = serde_json::from_str::<Value>(&line) else {
                continue;
            };
            let Some(Value::String(class)) = value.get("class").cloned() else {
                continue;
            };

            match class.as_str() {
                "SKY" => update_sky(&mut self.sky, &value),
                "TPV" => return Ok(build_gnss_data(&value, &self.sky)),
                _ => {}
            }
        }
    }

    pub fn iter(&mut self) -> DaemonGnssIter<'_> {
        DaemonGnssIter { reader: self }
    }
}

pub struct DaemonGnssIter<'a> {
    reader: &'a mut DaemonGnssReader,
}

impl<'a> Iterator for DaemonGnssIter<'a> {
    type Item = SensorResult<GnssData>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read() {
            Err(SensorError::Eof) => None,
            other => Some(other),
        }
    }
}

/// Reads one newline-terminated line. `Ok(None)` means the read timed out
/// with nothing decisive yet (the daemon variant treats this as "go back
/// to the top of the loop", unlike the serial variant's EOF-on-timeout).
fn read_line(mut stream: &TcpStream, cancelled: &AtomicBool) -> SensorResult<Option<String>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return Err(SensorError::Eof);
        }
        match stream.read(&mut byte) {
            Ok(0) => return Err(SensorError::Eof),
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Ok(None);
            }
            Err(e) => return Err(SensorError::HardwareFault(e)),
        }
    }
    while line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

fn update_sky(sky: &mut SkyState, value: &Value) {
    if let Some(u) = value.get("uSat").and_then(Value::as_i64) {
        sky.num_satellites = Some(u as i32);
    } else if let Some(n) = value.get("nSat").and_then(Value::as_i64) {
        sky.num_satellites = Some(n as i32);
    } else if let Some(sats) = value.get("satellites").and_then(Value::as_array) {
        let count = sats
            .iter()
            .filter(|s| s.get("used").and_then(Value::as_bool).unwrap_or(false))
            .count();
        sky.num_satellites = Some(count as i32);
    }

    if let Some(h) = value.get("hdop").and_then(Value::as_f64) {
        sky.hdop = Some(h);
    }
}

fn map_fix_quality(status: i64) -> i32 {
    match status {
        0 => 0,
        1 => 1,
        2 => 2,
        3 => 4,
        4 => 5,
        5 => 6,
        _ => 0,
    }
}

fn map_mode(status: i64) -> Option<String> {
    let mode = match status {
        0 => "N",
        1 => "A",
        2 => "D",
        3 => "D",
        4 => "D",
        5 => "E",
        _ => return None,
    };
    Some(mode.to_string())
}

/// Converts an ISO-8601 `Z`-suffixed timestamp (`"2025-03-01T12:35:19.000Z"`)
/// into NMEA `HHMMSS.ss`.
fn convert_iso_time(time: &str) -> Option<String> {
    let t_pos = time.find('T')?;
    let rest = time[t_pos + 1..].trim_end_matches('Z');
    let (hms, frac) = match rest.split_once('.') {
        Some((h, f)) => (h, Some(f)),
        None => (rest, None),
    };
    let parts: Vec<&str> = hms.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let frac2 = match frac {
        Some(f) if f.len() >= 2 => f[..2].to_string(),
        Some(f) => format!("{f:0<2}"),
        None => "00".to_string(),
    };
    Some(format!("{}{}{}.{}", parts[0], parts[1], parts[2], frac2))
}

fn build_gnss_data(value: &Value, sky: &SkyState) -> GnssData {
    let status = value.get("status").and_then(Value::as_i64).unwrap_or(0);
    let lat = value.get("lat").and_then(Value::as_f64);
    let lon = value.get("lon").and_then(Value::as_f64);
    let alt_msl = value.get("altMSL").and_then(Value::as_f64);
    let alt = value.get("alt").and_then(Value::as_f64);
    let time = value.get("time").and_then(Value::as_str);
    let speed = value.get("speed").and_then(Value::as_f64);
    let track = value.get("track").and_then(Value::as_f64);

    let fix_quality = map_fix_quality(status);
    let gga = GgaData {
        utc_time: time.and_then(convert_iso_time),
        latitude_degrees: lat,
        longitude_degrees: lon,
        fix_quality,
        num_satellites: sky.num_satellites,
        horizontal_dilution_of_precision: sky.hdop,
        altitude_meters: alt_msl.or(alt),
        geoid_height_meters: None,
        valid: fix_quality > 0,
    };

    let mode = map_mode(status);
    let valid = mode.as_deref().is_some_and(|m| m != "N");
    let vtg = VtgData {
        track_true_degrees: track,
        speed_knots: speed.map(|s| s * 1.94384),
        speed_kilometers_per_hour: speed.map(|s| s * 3.6),
        speed_meters_per_second: speed,
        mode,
        valid,
    };

    GnssData {
        gga,
        vtg: Some(vtg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_iso_time_with_millis() {
        assert_eq!(
            convert_iso_time("2025-03-01T12:35:19.000Z"),
            Some("123519.00".to_string())
        );
    }

    #[test]
    fn converts_iso_time_without_fraction() {
        assert_eq!(
            convert_iso_time("2025-03-01T12:35:19Z"),
            Some("123519.00".to_string())
        );
    }

    #[test]
    fn tpv_and_sky_combine_into_gnss_data() {
        let mut sky = SkyState::default();
        update_sky(
            &mut sky,
            &serde_json::json!({"class": "SKY", "uSat": 12, "hdop": 0.5}),
        );
        assert_eq!(sky.num_satellites, Some(12));
        assert_eq!(sky.hdop, Some(0.5));

        let tpv = serde_json::json!({
            "class": "TPV",
            "status": 3,
            "time": "2025-03-01T12:35:19.000Z",
            "lat": 48.1173,
            "lon": 11.5167,
            "altMSL": 545.4,
            "speed": 2.833,
            "track": 54.7
        });
        let data = build_gnss_data(&tpv, &sky);
        assert_eq!(data.gga.fix_quality, 4);
        assert_eq!(data.gga.num_satellites, Some(12));
        assert_eq!(data.gga.horizontal_dilution_of_precision, Some(0.5));
        assert_eq!(data.gga.utc_time.as_deref(), Some("123519.00"));
        let vtg = data.vtg.unwrap();
        assert_eq!(vtg.mode.as_deref(), Some("D"));
        assert_eq!(vtg.speed_meters_per_second, Some(2.833));
        assert_eq!(vtg.track_true_degrees, Some(54.7));
        assert!(vtg.valid);
    }

    #[test]
    fn sky_satellite_count_falls_back_to_used_count() {
        let mut sky = SkyState::default();
        update_sky(
            &mut sky,
            &serde_json::json!({
                "class": "SKY",
                "satellites": [
                    {"used": true}, {"used": false}, {"used": true}
                ]
            }),
        );
        assert_eq!(sky.num_satellites, Some(2));
    }

    #[test]
    fn status_zero_is_invalid_fix() {
        let sky = SkyState::default();
        let tpv = serde_json::json!({"class": "TPV", "status": 0});
        let data = build_gnss_data(&tpv, &sky);
        assert_eq!(data.gga.fix_quality, 0);
        assert!(!data.gga.valid);
        assert_eq!(data.vtg.unwrap().mode.as_deref(), Some("N"));
    }
}
