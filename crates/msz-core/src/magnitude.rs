//! Human readable magnitudes on the 万 / 亿 / 万亿 scale.

const SCALES: [(f64, &str); 3] = [(1e12, "万亿"), (1e8, "亿"), (1e4, "万")];

/// Formats `value` with two decimals, scaled to the largest of 万 (10⁴),
/// 亿 (10⁸) or 万亿 (10¹²) that its magnitude reaches.
///
/// ```
/// use msz_core::format_magnitude;
///
/// assert_eq!(format_magnitude(6.375e9), "63.75 亿");
/// assert_eq!(format_magnitude(-25_000.0), "-2.50 万");
/// assert_eq!(format_magnitude(12.5), "12.50");
/// ```
pub fn format_magnitude(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    match SCALES.iter().find(|(scale, _)| value.abs() >= *scale) {
        Some((scale, suffix)) => format!("{:.2} {suffix}", value / scale),
        None => format!("{value:.2}"),
    }
}
