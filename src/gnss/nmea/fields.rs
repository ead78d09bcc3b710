//! NMEA field parsing utilities.

pub const VALID_TALKER_IDS: [&str; 6] = ["GP", "GN", "GL", "GA", "GB", "GQ"];

pub fn parse_float_field(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

pub fn parse_int_field(value: &str) -> Option<i32> {
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

pub fn parse_string_field(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_coordinate_parts(value: &str) -> Option<(i32, f64)> {
    let dot = value.find('.')?;
    if dot < 2 {
        return None;
    }
    let degrees: i32 = value[..dot - 2].parse().ok()?;
    let minutes: f64 = value[dot - 2..].parse().ok()?;
    Some((degrees, minutes))
}

/// Converts an NMEA coordinate (`DDDMM.MMMM`) and hemisphere letter into
/// decimal degrees.
pub fn convert_to_decimal_degrees(value: &str, direction: &str) -> Option<f64> {
    if value.is_empty() || direction.is_empty() {
        return None;
    }
    let (degrees, minutes) = parse_coordinate_parts(value)?;
    let decimal_degrees = degrees as f64 + minutes / 60.0;
    if direction == "S" || direction == "W" {
        Some(-decimal_degrees)
    } else {
        Some(decimal_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_north_and_west() {
        assert!((convert_to_decimal_degrees("4807.038", "N").unwrap() - 48.1173).abs() < 1e-4);
        let west = convert_to_decimal_degrees("01131.000", "W").unwrap();
        assert!((west - (-11.5166666)).abs() < 1e-4);
    }

    #[test]
    fn empty_value_is_none() {
        assert_eq!(convert_to_decimal_degrees("", "N"), None);
        assert_eq!(convert_to_decimal_degrees("4807.038", ""), None);
    }

    #[test]
    fn int_and_float_fields_reject_empty_and_garbage() {
        assert_eq!(parse_int_field(""), None);
        assert_eq!(parse_int_field("08"), Some(8));
        assert_eq!(parse_float_field(""), None);
        assert_eq!(parse_float_field("0.9"), Some(0.9));
    }
}
