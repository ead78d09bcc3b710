//! Producer loops run on dedicated OS threads: blocking hardware/socket I/O
//! feeding the broadcaster. Neither loop ever touches subscriber queues
//! directly — only `Broadcaster::broadcast` does that.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::broadcaster::Broadcaster;
use crate::error::SensorError;
use crate::formatters::{format_gnss, format_imu};
use crate::gnss::GnssReader;
use crate::imu::ImuReader;

/// Runs the GNSS producer loop until the reader reaches `Eof` (including
/// cooperative cancellation) or `stop` is set. Any other error is logged
/// and ends the loop, matching the "producer loop exits, service keeps
/// serving remaining subscribers" policy.
pub fn run_gnss_loop(mut reader: GnssReader, broadcaster: Arc<Broadcaster>, stop: Arc<AtomicBool>) {
    loop {
        if stop.load(Ordering::Relaxed) {
            info!("gnss loop: stop requested, exiting");
            return;
        }

        match reader.read() {
            Ok(sample) => {
                broadcaster.broadcast(&format_gnss(&sample));
            }
            Err(SensorError::Eof) => {
                info!("gnss loop: stream ended, exiting cleanly");
                return;
            }
            Err(SensorError::HardwareFault(e)) => {
                error!("gnss loop: hardware fault, exiting: {e}");
                return;
            }
            Err(e) => {
                warn!("gnss loop: unexpected error, exiting: {e}");
                return;
            }
        }
    }
}

/// Runs the IMU producer loop. Broadcasts every 5th successful read
/// (~100 Hz sampled down to ~20 Hz); timeouts leave the decimation counter
/// untouched and are not themselves errors.
pub fn run_imu_loop(
    mut reader: ImuReader,
    timeout: Duration,
    broadcaster: Arc<Broadcaster>,
    stop: Arc<AtomicBool>,
) {
    let mut counter: u64 = 0;

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("imu loop: stop requested, exiting");
            return;
        }

        match reader.read(timeout) {
            Ok(sample) => {
                let broadcast_this_sample = counter % 5 == 0;
                counter += 1;
                if broadcast_this_sample {
                    broadcaster.broadcast(&format_imu(&sample));
                }
            }
            Err(SensorError::Timeout(_)) => {
                // No sample; counter does not advance.
            }
            Err(SensorError::HardwareFault(e)) => {
                error!("imu loop: hardware fault, exiting: {e}");
                return;
            }
            Err(e) => {
                warn!("imu loop: unexpected error, exiting: {e}");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // Decimation arithmetic is exercised directly rather than through a
    // live reader: the 1st, 6th, 11th, ... successful samples broadcast.
    #[test]
    fn decimation_fires_on_every_fifth_successful_sample_starting_at_the_first() {
        let mut counter: u64 = 0;
        let mut broadcasts = Vec::new();
        for attempt in 1..=12u64 {
            let broadcast_this_sample = counter % 5 == 0;
            counter += 1;
            if broadcast_this_sample {
                broadcasts.push(attempt);
            }
        }
        assert_eq!(broadcasts, vec![1, 6, 11]);
    }
}
