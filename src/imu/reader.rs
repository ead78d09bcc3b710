//! ISM330DHCX IMU reader: SPI burst reads gated by a GPIO DRDY interrupt.
//!
//! Hardware configuration (fixed register values):
//!   Accelerometer: FS=±2g,       ODR=104 Hz (CTRL1_XL = 0x40)
//!   Gyroscope:     FS=±2000 dps, ODR=104 Hz (CTRL2_G  = 0x4C)
//!   INT1 pin:      DRDY_A (accelerometer data-ready, bit 0 of INT1_CTRL)
//!
//! The gyroscope's ±2000 dps label is not the true full-scale — physical
//! values are always derived from the datasheet sensitivity constant below,
//! never from the range label (see `GYRO_SENSITIVITY`).

use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use gpio_cdev::{Chip, EventRequestFlags, LineEventHandle, LineRequestFlags};
use nix::poll::{poll, PollFd, PollFlags};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::error::{SensorError, SensorResult};
use crate::imu::types::ImuSample;

const REG_INT1_CTRL: u8 = 0x0D;
const REG_CTRL1_XL: u8 = 0x10;
const REG_CTRL2_G: u8 = 0x11;
const REG_CTRL3_C: u8 = 0x12;

/// First output register: gyro X/Y/Z (0x22-0x27), then accel X/Y/Z (0x28-0x2D).
const REG_OUTX_L_G: u8 = 0x22;
const READ_BIT: u8 = 0x80;

/// Accelerometer FS=±2g: 0.061 mg/LSB, converted to m/s² per LSB.
const ACCEL_SENSITIVITY: f64 = 0.061e-3 * 9.80665;
/// Gyroscope FS=±2000 dps: 70 mdps/LSB, converted to rad/s per LSB.
const GYRO_SENSITIVITY: f64 = 70.0e-3 * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone)]
pub struct ImuReaderConfig {
    pub gpio_chip: String,
    pub gpio_line: u32,
    pub spi_bus: u8,
    pub spi_device: u8,
}

/// Owns SPI and GPIO resources for the lifetime of the reader. Resources are
/// claimed by `open` in the order reset → arm edge detection → start
/// measurement, and released unconditionally by `Drop` in the reverse order:
/// release the GPIO line, close the chip, close SPI.
pub struct ImuReader {
    spi: Option<Spidev>,
    chip: Option<Chip>,
    events: Option<LineEventHandle>,
}

impl ImuReader {
    /// Opens SPI and GPIO, resets and configures the IMU. Returns a
    /// `ConfigurationError` (with everything already opened released) if any
    /// step fails.
    pub fn open(config: &ImuReaderConfig) -> SensorResult<Self> {
        let spi_path = format!("/dev/spidev{}.{}", config.spi_bus, config.spi_device);
        let mut spi = Spidev::open(&spi_path)
            .map_err(|e| SensorError::ConfigurationError(format!("open {spi_path}: {e}")))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(5_000_000)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options)
            .map_err(|e| SensorError::ConfigurationError(format!("configure spi: {e}")))?;

        // Reset before arming GPIO so no spurious edges are missed.
        reset_imu(&mut spi)
            .map_err(|e| SensorError::ConfigurationError(format!("reset imu: {e}")))?;

        let mut chip = Chip::new(&config.gpio_chip).map_err(|e| {
            SensorError::ConfigurationError(format!("open {}: {e}", config.gpio_chip))
        })?;
        let line = chip.get_line(config.gpio_line).map_err(|e| {
            SensorError::ConfigurationError(format!("get line {}: {e}", config.gpio_line))
        })?;
        let events = line
            .events(
                LineRequestFlags::INPUT,
                EventRequestFlags::RISING_EDGE,
                "imu-reader",
            )
            .map_err(|e| SensorError::ConfigurationError(format!("request line events: {e}")))?;

        // GPIO edge detection is active; safe to start the measurement cycle.
        start_imu(&mut spi)
            .map_err(|e| SensorError::ConfigurationError(format!("start imu: {e}")))?;

        Ok(Self {
            spi: Some(spi),
            chip: Some(chip),
            events: Some(events),
        })
    }

    /// Blocks until the next DRDY interrupt (or `timeout` elapses) and
    /// returns one IMU sample stamped with the edge's kernel timestamp.
    pub fn read(&mut self, timeout: Duration) -> SensorResult<ImuSample> {
        let events = self.events.as_mut().expect("ImuReader used after close");
        let spi = self.spi.as_mut().expect("ImuReader used after close");

        let raw_fd = events.as_raw_fd();
        // SAFETY: `raw_fd` stays open for at least as long as `events`, which
        // outlives this borrow.
        let borrowed_fd = unsafe { std::os::fd::BorrowedFd::borrow_raw(raw_fd) };
        let mut fds = [PollFd::new(borrowed_fd, PollFlags::POLLIN)];
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let ready = poll(&mut fds, millis).map_err(std::io::Error::from)?;
        if ready == 0 {
            return Err(SensorError::Timeout(timeout));
        }

        let event = events
            .next()
            .ok_or(SensorError::Eof)?
            .map_err(|e| SensorError::HardwareFault(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        let timestamp_ns = event.timestamp();
        read_sample(spi, timestamp_ns)
    }

    /// Yields samples indefinitely; `Timeout` is surfaced as an `Err` item
    /// rather than silently skipped, so callers keep their own decimation
    /// policy intact.
    pub fn iter_with_timeout(&mut self, timeout: Duration) -> ImuIter<'_> {
        ImuIter {
            reader: self,
            timeout,
        }
    }
}

pub struct ImuIter<'a> {
    reader: &'a mut ImuReader,
    timeout: Duration,
}

impl<'a> Iterator for ImuIter<'a> {
    type Item = SensorResult<ImuSample>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read(self.timeout) {
            Err(SensorError::Eof) => None,
            other => Some(other),
        }
    }
}

impl Drop for ImuReader {
    fn drop(&mut self) {
        self.events.take();
        self.chip.take();
        self.spi.take();
    }
}

fn reset_imu(spi: &mut Spidev) -> std::io::Result<()> {
    spi.write_all(&[REG_CTRL3_C, 0x01])?; // SW_RESET
    std::thread::sleep(Duration::from_millis(100));
    spi.write_all(&[REG_CTRL3_C, 0x44])?; // BDU=1, IF_INC=1
    Ok(())
}

fn start_imu(spi: &mut Spidev) -> std::io::Result<()> {
    spi.write_all(&[REG_INT1_CTRL, 0x01])?; // INT1_DRDY_A
    spi.write_all(&[REG_CTRL2_G, 0x4C])?; // gyro 104 Hz, FS=±2000 dps
    spi.write_all(&[REG_CTRL1_XL, 0x40])?; // accel 104 Hz, FS=±2g — starts the cycle
    Ok(())
}

fn read_sample(spi: &mut Spidev, timestamp_ns: u64) -> SensorResult<ImuSample> {
    let tx = [REG_OUTX_L_G | READ_BIT, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let mut rx = [0u8; 13];
    {
        let mut transfer = SpidevTransfer::read_write(&tx, &mut rx);
        spi.transfer(&mut transfer)?;
    }
    Ok(parse_sample(&rx[1..13], timestamp_ns))
}

/// Converts 12 raw output-register bytes (gyro X/Y/Z, then accel X/Y/Z,
/// little-endian signed 16-bit) into physical units.
pub fn parse_sample(raw: &[u8], timestamp_ns: u64) -> ImuSample {
    assert_eq!(raw.len(), 12, "IMU burst read must be exactly 12 bytes");
    let gx = i16::from_le_bytes([raw[0], raw[1]]);
    let gy = i16::from_le_bytes([raw[2], raw[3]]);
    let gz = i16::from_le_bytes([raw[4], raw[5]]);
    let ax = i16::from_le_bytes([raw[6], raw[7]]);
    let ay = i16::from_le_bytes([raw[8], raw[9]]);
    let az = i16::from_le_bytes([raw[10], raw[11]]);

    ImuSample {
        timestamp_ns,
        accel_x: ax as f64 * ACCEL_SENSITIVITY,
        accel_y: ay as f64 * ACCEL_SENSITIVITY,
        accel_z: az as f64 * ACCEL_SENSITIVITY,
        gyro_x: gx as f64 * GYRO_SENSITIVITY,
        gyro_y: gy as f64 * GYRO_SENSITIVITY,
        gyro_z: gz as f64 * GYRO_SENSITIVITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_bytes_yield_zero_physical_values() {
        let raw = [0u8; 12];
        let sample = parse_sample(&raw, 42);
        assert_eq!(sample.timestamp_ns, 42);
        assert_eq!(sample.accel_x, 0.0);
        assert_eq!(sample.accel_y, 0.0);
        assert_eq!(sample.accel_z, 0.0);
        assert_eq!(sample.gyro_x, 0.0);
        assert_eq!(sample.gyro_y, 0.0);
        assert_eq!(sample.gyro_z, 0.0);
    }

    #[test]
    fn accel_max_positive_lsb_is_about_one_g() {
        // accel Z is bytes 10..12 of the 12-byte payload; 16384 LSB.
        let mut raw = [0u8; 12];
        let bytes = 16384i16.to_le_bytes();
        raw[10] = bytes[0];
        raw[11] = bytes[1];
        let sample = parse_sample(&raw, 0);
        assert!((sample.accel_z - 9.80665).abs() / 9.80665 < 0.01);
    }

    #[test]
    fn gyro_full_scale_lsb_does_not_equal_nominal_2000_dps() {
        // gyro Z is bytes 4..6; int16 max.
        let mut raw = [0u8; 12];
        let bytes = i16::MAX.to_le_bytes();
        raw[4] = bytes[0];
        raw[5] = bytes[1];
        let sample = parse_sample(&raw, 0);
        let expected = 2293.69 * std::f64::consts::PI / 180.0;
        assert!((sample.gyro_z - expected).abs() < 1e-2);
        let nominal_2000 = 2000.0 * std::f64::consts::PI / 180.0;
        assert!((sample.gyro_z - nominal_2000).abs() > 1.0);
    }
}
