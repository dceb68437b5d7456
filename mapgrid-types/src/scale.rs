//! Conversions between meters, degrees and MC2 coordinate units.
//!
//! One MC2 unit is `360 / 2^32` degrees, so the whole circle of longitudes
//! fits in a signed 32-bit integer.

/// MC2 units per meter along a great circle.
pub const METER_TO_MC2SCALE: f64 = 107.170_934_2;

/// Meters per MC2 unit.
pub const MC2SCALE_TO_METER: f64 = 1.0 / METER_TO_MC2SCALE;

/// Square meters per square MC2 unit.
pub const SQUARE_MC2SCALE_TO_SQUARE_METER: f64 = MC2SCALE_TO_METER * MC2SCALE_TO_METER;

/// Square MC2 units per square meter.
pub const SQUARE_METER_TO_SQUARE_MC2SCALE: f64 = METER_TO_MC2SCALE * METER_TO_MC2SCALE;

/// Degrees per MC2 unit.
pub const MC2SCALE_TO_DEGREES: f64 = 360.0 / 4_294_967_296.0;

/// Convert a distance in meters to MC2 units, saturating at `i32::MAX`.
///
/// # Examples
///
/// ```
/// use mapgrid_types::scale::meters_to_mc2;
///
/// assert_eq!(meters_to_mc2(0.0), 0);
/// assert_eq!(meters_to_mc2(100.0), 10_717);
/// ```
pub fn meters_to_mc2(meters: f64) -> i32 {
    (meters * METER_TO_MC2SCALE) as i32
}

/// Convert a distance in MC2 units to meters.
pub fn mc2_to_meters(mc2: i64) -> f64 {
    mc2 as f64 * MC2SCALE_TO_METER
}

/// Convert a squared MC2 distance, as returned by the index, to square meters.
pub fn square_mc2_to_square_meters(square_dist: u64) -> f64 {
    square_dist as f64 * SQUARE_MC2SCALE_TO_SQUARE_METER
}

/// Convert an MC2 coordinate to degrees.
pub fn mc2_to_degrees(value: i32) -> f64 {
    f64::from(value) * MC2SCALE_TO_DEGREES
}

/// Convert degrees to an MC2 coordinate, saturating at the `i32` range.
pub fn degrees_to_mc2(degrees: f64) -> i32 {
    (degrees / MC2SCALE_TO_DEGREES).round() as i32
}
