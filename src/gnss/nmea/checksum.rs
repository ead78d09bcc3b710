//! NMEA 0183 checksum validation.

/// Splits a sentence into its content (between `$` and `*`) and the
/// two-character hex checksum that follows `*`.
fn extract_checksum_parts(sentence: &str) -> Option<(&str, &str)> {
    if !sentence.starts_with('$') {
        return None;
    }
    let star = sentence.find('*')?;
    let content = &sentence[1..star];
    let provided = sentence.get(star + 1..star + 3)?;
    if provided.len() != 2 {
        return None;
    }
    Some((content, provided))
}

fn calculate_xor_checksum(content: &str) -> u8 {
    content.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Validates the XOR checksum of all bytes between `$` and `*` (exclusive).
pub fn validate_checksum(sentence: &str) -> bool {
    let sentence = sentence.trim();
    let Some((content, provided)) = extract_checksum_parts(sentence) else {
        return false;
    };
    let Ok(expected) = u8::from_str_radix(provided, 16) else {
        return false;
    };
    calculate_xor_checksum(content) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_checksum_passes() {
        assert!(validate_checksum(
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47"
        ));
    }

    #[test]
    fn tampered_content_fails() {
        assert!(!validate_checksum(
            "$GPGGA,999999,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47"
        ));
    }

    #[test]
    fn missing_dollar_or_star_fails() {
        assert!(!validate_checksum("GPGGA,123519*47"));
        assert!(!validate_checksum("$GPGGA,123519"));
    }
}
