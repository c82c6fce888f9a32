//! Unit conversions for OOXML measurements.
//!
//! Twentieths of a point (twips) convert to points; English Metric Units
//! convert to pixels at 96 DPI, where 914400 EMU is one inch.

/// EMU per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Pixels per inch for display sizing.
pub const PX_PER_INCH: f64 = 96.0;

/// Convert twips to points.
pub fn twips_to_points(twips: i64) -> f64 {
    twips as f64 / 20.0
}

/// Convert EMU to pixels at 96 DPI.
pub fn emu_to_px(emu: i64) -> f64 {
    emu as f64 * PX_PER_INCH / EMU_PER_INCH
}

/// Convert 60000ths-of-a-degree rotation values to degrees.
pub fn angle_units_to_degrees(units: i64) -> f64 {
    units as f64 / 60_000.0
}

/// Convert per-cent-thousand crop fractions (0..=100000) to 0.0..=1.0.
pub fn crop_fraction(value: i64) -> f64 {
    (value as f64 / 100_000.0).clamp(0.0, 1.0)
}
