//! GNSS data types shared by both reader variants.

/// Parsed GGA (Global Positioning System Fix Data) sentence.
///
/// `valid` indicates navigation validity (`fix_quality > 0`), not parse
/// validity — a successfully parsed sentence with no fix has `valid: false`.
#[derive(Debug, Clone, PartialEq)]
pub struct GgaData {
    pub utc_time: Option<String>,
    pub latitude_degrees: Option<f64>,
    pub longitude_degrees: Option<f64>,
    pub fix_quality: i32,
    pub num_satellites: Option<i32>,
    pub horizontal_dilution_of_precision: Option<f64>,
    pub altitude_meters: Option<f64>,
    pub geoid_height_meters: Option<f64>,
    pub valid: bool,
}

/// Parsed VTG (Track Made Good and Ground Speed) sentence.
///
/// `valid` indicates navigation validity (mode present and not `"N"`), not
/// parse validity.
#[derive(Debug, Clone, PartialEq)]
pub struct VtgData {
    pub track_true_degrees: Option<f64>,
    pub speed_knots: Option<f64>,
    pub speed_kilometers_per_hour: Option<f64>,
    pub speed_meters_per_second: Option<f64>,
    pub mode: Option<String>,
    pub valid: bool,
}

/// A combined GNSS sample pairing a GGA fix with the most recent VTG
/// velocity. One `GnssData` is emitted per GGA sentence received; `vtg` is
/// `None` until the first VTG sentence has arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssData {
    pub gga: GgaData,
    pub vtg: Option<VtgData>,
}
