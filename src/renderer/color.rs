/// Compression factor for log-scaled normalization.
pub(crate) const LOG_ALPHA: f64 = 4.0;

/// Background behind velocity arrows (#1a1a1a).
pub(crate) const ARROW_BACKGROUND: [u8; 3] = [0x1a, 0x1a, 0x1a];

/// Cursor indicator colors: blue while free, red while locked.
pub(crate) const CURSOR_FREE: [u8; 3] = [0x3b, 0x82, 0xf6];
pub(crate) const CURSOR_LOCKED: [u8; 3] = [0xef, 0x44, 0x44];

/// Largest absolute value in a field; 0 for an empty or all-zero field.
pub fn max_magnitude(data: &[f64]) -> f64 {
    data.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

/// Linear symmetric normalization: `value / (max_mag + 1e-6)`.
pub fn normalize_linear(value: f64, max_mag: f64) -> f64 {
    value / (max_mag + 1e-6)
}

/// Log symmetric normalization: `sign * ln(1 + 4|v|) / ln(1 + 4 max_mag)`.
/// A zero field maps to 0 rather than NaN.
pub fn normalize_log(value: f64, max_mag: f64) -> f64 {
    let denom = (1.0 + LOG_ALPHA * max_mag).ln();
    if denom <= 0.0 {
        return 0.0;
    }
    value.signum() * (1.0 + LOG_ALPHA * value.abs()).ln() / denom
}

/// Diverging blue-white-red map for a value in `[-1, 1]` (clamped).
/// -1 is pure blue, 0 white, +1 pure red.
pub fn diverging_rgba(normalized: f64) -> [u8; 4] {
    let c = if normalized.is_nan() { 0.0 } else { normalized.clamp(-1.0, 1.0) };
    if c < 0.0 {
        let fade = (255.0 * (1.0 + c)).floor() as u8;
        [fade, fade, 255, 255]
    } else {
        let fade = (255.0 * (1.0 - c)).floor() as u8;
        [255, fade, fade, 255]
    }
}

/// Arrow hue: red for rightward flow, blue otherwise (HSL 80% sat, 60% light).
pub fn arrow_color(uc: f64) -> [f64; 3] {
    if uc > 0.0 {
        [234.6, 71.4, 71.4]
    } else {
        [71.4, 71.4, 234.6]
    }
}
