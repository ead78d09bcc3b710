//! NMEA 0183 sentence parsing: checksum validation, field helpers, and the
//! GGA/VTG sentence parsers.

mod checksum;
mod fields;
mod gga;
mod vtg;

pub use checksum::validate_checksum;
pub use fields::{convert_to_decimal_degrees, parse_float_field, parse_int_field, VALID_TALKER_IDS};
pub use gga::parse_gga;
pub use vtg::parse_vtg;
