//! Wire-shape formatters. Both functions are pure: the wire structs below
//! mirror §6's field set independently of the internal types' naming, so a
//! field rename inside `gnss`/`imu` never silently changes the wire shape.

use serde::Serialize;

use crate::gnss::GnssData;
use crate::imu::ImuSample;

#[derive(Serialize)]
struct GnssMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
    fix_quality: i32,
    num_satellites: Option<i32>,
    hdop: Option<f64>,
    utc_time: Option<&'a str>,
    speed_ms: Option<f64>,
    track_degrees: Option<f64>,
    vtg_valid: Option<bool>,
}

#[derive(Serialize)]
struct ImuMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp_ns: u64,
    accel_x: f64,
    accel_y: f64,
    accel_z: f64,
    gyro_z: f64,
}

/// Serializes a GNSS sample. Fields absent in the source sample (no fix,
/// no VTG yet observed) serialize to JSON `null`, never `0`.
pub fn format_gnss(sample: &GnssData) -> String {
    let vtg = sample.vtg.as_ref();
    let message = GnssMessage {
        kind: "gnss",
        lat: sample.gga.latitude_degrees,
        lon: sample.gga.longitude_degrees,
        alt: sample.gga.altitude_meters,
        fix_quality: sample.gga.fix_quality,
        num_satellites: sample.gga.num_satellites,
        hdop: sample.gga.horizontal_dilution_of_precision,
        utc_time: sample.gga.utc_time.as_deref(),
        speed_ms: vtg.and_then(|v| v.speed_meters_per_second),
        track_degrees: vtg.and_then(|v| v.track_true_degrees),
        vtg_valid: vtg.map(|v| v.valid),
    };
    serde_json::to_string(&message).expect("wire structs never fail to serialize")
}

/// Serializes an IMU sample. Only `gyro_z` is wired per the chosen payload
/// shape; `gyro_x`/`gyro_y` are available on the sample but intentionally
/// not broadcast (see the project's grounding notes).
pub fn format_imu(sample: &ImuSample) -> String {
    let message = ImuMessage {
        kind: "imu",
        timestamp_ns: sample.timestamp_ns,
        accel_x: sample.accel_x,
        accel_y: sample.accel_y,
        accel_z: sample.accel_z,
        gyro_z: sample.gyro_z,
    };
    serde_json::to_string(&message).expect("wire structs never fail to serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnss::{GgaData, VtgData};
    use serde_json::Value;

    fn sample_gga() -> GgaData {
        GgaData {
            utc_time: Some("123519.00".to_string()),
            latitude_degrees: Some(48.1173),
            longitude_degrees: Some(11.51667),
            fix_quality: 1,
            num_satellites: Some(8),
            horizontal_dilution_of_precision: Some(0.9),
            altitude_meters: Some(545.4),
            geoid_height_meters: Some(47.0),
            valid: true,
        }
    }

    #[test]
    fn gnss_without_vtg_yields_null_vtg_fields() {
        let sample = GnssData {
            gga: sample_gga(),
            vtg: None,
        };
        let json: Value = serde_json::from_str(&format_gnss(&sample)).unwrap();
        assert_eq!(json["vtg_valid"], Value::Null);
        assert_eq!(json["speed_ms"], Value::Null);
        assert_eq!(json["track_degrees"], Value::Null);
        assert_eq!(json["fix_quality"], 1);
        assert_eq!(json["lat"], 48.1173);
    }

    #[test]
    fn gnss_with_valid_vtg_yields_true() {
        let sample = GnssData {
            gga: sample_gga(),
            vtg: Some(VtgData {
                track_true_degrees: Some(54.7),
                speed_knots: Some(5.5),
                speed_kilometers_per_hour: Some(10.2),
                speed_meters_per_second: Some(2.833),
                mode: Some("A".to_string()),
                valid: true,
            }),
        };
        let json: Value = serde_json::from_str(&format_gnss(&sample)).unwrap();
        assert_eq!(json["vtg_valid"], true);
        assert_eq!(json["speed_ms"], 2.833);
    }

    #[test]
    fn gnss_with_invalid_vtg_yields_false() {
        let sample = GnssData {
            gga: sample_gga(),
            vtg: Some(VtgData {
                track_true_degrees: None,
                speed_knots: None,
                speed_kilometers_per_hour: None,
                speed_meters_per_second: None,
                mode: Some("N".to_string()),
                valid: false,
            }),
        };
        let json: Value = serde_json::from_str(&format_gnss(&sample)).unwrap();
        assert_eq!(json["vtg_valid"], false);
    }

    #[test]
    fn imu_message_routes_only_gyro_z() {
        let sample = ImuSample {
            timestamp_ns: 42,
            accel_x: 1.0,
            accel_y: 2.0,
            accel_z: 3.0,
            gyro_x: 4.0,
            gyro_y: 5.0,
            gyro_z: 6.0,
        };
        let json: Value = serde_json::from_str(&format_imu(&sample)).unwrap();
        assert_eq!(json["type"], "imu");
        assert_eq!(json["gyro_z"], 6.0);
        assert!(json.get("gyro_x").is_none());
        assert!(json.get("gyro_y").is_none());
    }
}
