//! GGA sentence parser.

use super::checksum::validate_checksum;
use super::fields::{
    convert_to_decimal_degrees, parse_float_field, parse_int_field, parse_string_field,
    VALID_TALKER_IDS,
};
use crate::gnss::types::GgaData;

const MINIMUM_FIELD_COUNT: usize = 14;

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
        && sentence_type == b"GGA"
}

fn build_gga_data(fields: &[&str]) -> GgaData {
    let fix_quality = parse_int_field(fields[6]).unwrap_or(0);
    GgaData {
        utc_time: parse_string_field(fields[1]),
        latitude_degrees: convert_to_decimal_degrees(fields[2], fields[3]),
        longitude_degrees: convert_to_decimal_degrees(fields[4], fields[5]),
        fix_quality,
        num_satellites: parse_int_field(fields[7]),
        horizontal_dilution_of_precision: parse_float_field(fields[8]),
        altitude_meters: parse_float_field(fields[9]),
        geoid_height_meters: parse_float_field(fields[11]),
        valid: fix_quality > 0,
    }
}

/// Parses a GGA sentence, returning `None` on any checksum, field-count, or
/// message-type mismatch. Parse failures are absorbed here, never
/// propagated as errors.
pub fn parse_gga(sentence: &str) -> Option<GgaData> {
    let sentence = sentence.trim();
    if !validate_checksum(sentence) {
        return None;
    }
    let fields = extract_fields(sentence)?;
    if !validate_message_type(&fields) {
        return None;
    }
    Some(build_gga_data(&fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_valid_fix() {
        let data =
            parse_gga("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47")
                .unwrap();
        assert_eq!(data.utc_time.as_deref(), Some("123519"));
        assert!((data.latitude_degrees.unwrap() - 48.1173).abs() < 1e-4);
        assert_eq!(data.fix_quality, 1);
        assert_eq!(data.num_satellites, Some(8));
        assert!(data.valid);
    }

    #[test]
    fn zero_fix_quality_is_not_valid() {
        let data = parse_gga("$GPGGA,123519,,,,,,0,,,,,M,,,*0A").unwrap();
        assert_eq!(data.fix_quality, 0);
        assert!(!data.valid);
        assert_eq!(data.latitude_degrees, None);
    }

    #[test]
    fn bad_checksum_yields_none() {
        assert!(parse_gga(
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00"
        )
        .is_none());
    }

    #[test]
    fn wrong_sentence_type_yields_none() {
        assert!(parse_gga(
            "$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,A*48"
        )
        .is_none());
    }
}
