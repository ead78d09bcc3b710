//! VTG sentence parser.

use super::checksum::validate_checksum;
use super::fields::{parse_float_field, parse_string_field, VALID_TALKER_IDS};
use crate::gnss::types::VtgData;

const MINIMUM_FIELD_COUNT: usize = 9;
const KILOMETERS_PER_HOUR_TO_METERS_PER_SECOND: f64 = 3.6;

fn extract_fields(sentence: &str) -> Option<Vec<&str>> {
    let star = sentence.find('*')?;
    let content = &sentence[1..star];
    let fields: Vec<&str> = content.split(',').collect();
    if fields.len() < MINIMUM_FIELD_COUNT {
        return None;
    }
    Some(fields)
}

fn validate_message_type(fields: &[&str]) -> bool {
    let message_type = fields[0];
    if message_type.len() < 5 {
        return false;
    }
    let bytes = message_type.as_bytes();
    let (Some(talker_id), Some(sentence_type)) = (bytes.get(..2), bytes.get(2..)) else {
        return false;
    };
    VALID_TALKER_IDS
        .iter()
        .any(|id| id.as_bytes() == talker_id)
        && sentence_type == b"VTG"
}

fn extract_mode(fields: &[&str]) -> Option<String> {
    fields.get(9).and_then(|f| parse_string_field(f))
}

fn compute_speed_meters_per_second(speed_kmh: Option<f64>) -> Option<f64> {
    speed_kmh.map(|v| v / KILOMETERS_PER_HOUR_TO_METERS_PER_SECOND)
}

fn build_vtg_data(fields: &[&str]) -> VtgData {
    let speed_kilometers_per_hour = parse_float_field(fields[7]);
    let mode = extract_mode(fields);
    let valid = mode.as_deref().is_some_and(|m| m != "N");

    VtgData {
        track_true_degrees: parse_float_field(fields[1]),
        speed_knots: parse_float_field(fields[5]),
        speed_kilometers_per_hour,
        speed_meters_per_second: compute_speed_meters_per_second(speed_kilometers_per_hour),
        mode,
        valid,
    }
}

/// Parses a VTG sentence, returning `None` on any checksum, field-count, or
/// message-type mismatch. Parse failures are absorbed here, never
/// propagated as errors.
pub fn parse_vtg(sentence: &str) -> Option<VtgData> {
    let sentence = sentence.trim();
    if !validate_checksum(sentence) {
        return None;
    }
    let fields = extract_fields(sentence)?;
    if !validate_message_type(&fields) {
        return None;
    }
    Some(build_vtg_data(&fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_velocity() {
        let data = parse_vtg("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,A*25").unwrap();
        assert_eq!(data.track_true_degrees, Some(54.7));
        assert_eq!(data.speed_knots, Some(5.5));
        assert_eq!(data.speed_kilometers_per_hour, Some(10.2));
        assert!((data.speed_meters_per_second.unwrap() - 10.2 / 3.6).abs() < 1e-9);
        assert_eq!(data.mode.as_deref(), Some("A"));
        assert!(data.valid);
    }

    #[test]
    fn mode_n_is_not_valid() {
        let data = parse_vtg("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,N*2A").unwrap();
        assert_eq!(data.mode.as_deref(), Some("N"));
        assert!(!data.valid);
    }

    #[test]
    fn missing_mode_field_is_not_valid() {
        let data = parse_vtg("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,*64").unwrap();
        assert_eq!(data.mode, None);
        assert!(!data.valid);
    }
}
