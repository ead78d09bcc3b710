//! Process-wide configuration, read once at startup from the environment.
//!
//! Mirrors the env-var-with-documented-fallback convention used throughout
//! this codebase's other subsystems (see `UwbHubConfig` in the original
//! telemetry hub this crate grew out of) rather than a reloadable config file.

use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_or_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnssSource {
    Serial,
    Daemon,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origins: String,
    pub static_dir: String,

    pub imu_gpio_chip: String,
    pub imu_gpio_line: u32,
    pub imu_spi_bus: u8,
    pub imu_spi_device: u8,
    pub imu_read_timeout: Duration,

    pub gnss_source: GnssSource,
    pub gnss_serial_port: String,
    pub gnss_serial_baud: u32,
    pub gnss_daemon_host: String,
    pub gnss_daemon_port: u16,
    pub gnss_read_timeout: Duration,

    pub subscriber_queue_capacity: usize,
    pub subscriber_idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let gnss_source = match std::env::var("GNSS_SOURCE").as_deref() {
            Ok("daemon") => GnssSource::Daemon,
            _ => GnssSource::Serial,
        };

        Self {
            port: env_or("PORT", 3000),
            cors_origins: env_or_string(
                "CORS_ORIGINS",
                "http://localhost:3000,http://localhost:5173",
            ),
            static_dir: env_or_string("STATIC_DIR", "./static"),

            imu_gpio_chip: env_or_string("IMU_GPIO_CHIP", "/dev/gpiochip4"),
            imu_gpio_line: env_or("IMU_GPIO_LINE", 25),
            imu_spi_bus: env_or("IMU_SPI_BUS", 0),
            imu_spi_device: env_or("IMU_SPI_DEVICE", 0),
            imu_read_timeout: Duration::from_millis(env_or("IMU_READ_TIMEOUT_MS", 1000)),

            gnss_source,
            gnss_serial_port: env_or_string("GNSS_SERIAL_PORT", "/dev/ttyAMA5"),
            gnss_serial_baud: env_or("GNSS_SERIAL_BAUD", 38400),
            gnss_daemon_host: env_or_string("GNSS_DAEMON_HOST", "localhost"),
            gnss_daemon_port: env_or("GNSS_DAEMON_PORT", 2947),
            gnss_read_timeout: Duration::from_millis(env_or("GNSS_READ_TIMEOUT_MS", 2000)),

            subscriber_queue_capacity: env_or("SUBSCRIBER_QUEUE_CAPACITY", 10),
            subscriber_idle_timeout: Duration::from_millis(env_or(
                "SUBSCRIBER_IDLE_TIMEOUT_MS",
                5000,
            )),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
