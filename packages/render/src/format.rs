//! Display formatting for metric values.

use cluster_map_place_models::NOT_AVAILABLE;

/// Groups the digits of an integer with commas (`1234567` -> `1,234,567`).
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Groups the digits of a number of items.
#[must_use]
pub fn format_len(len: usize) -> String {
    group_thousands(i64::try_from(len).unwrap_or(i64::MAX))
}

/// Truncates a count toward zero and groups its digits.
///
/// Non-finite values render as `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_count(value: f64) -> String {
    if value.is_finite() {
        group_thousands(value.trunc() as i64)
    } else {
        "0".to_string()
    }
}

/// Fixed-point rendering with `decimals` digits.
#[must_use]
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// A fraction shown as a percentage with two decimals (`0.25` -> `25.00%`).
#[must_use]
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// A distance in kilometers with one decimal (`5.0`, `2.5`).
#[must_use]
pub fn format_km(km: f64) -> String {
    format!("{km:.1}")
}

/// An hour of day as `HH:00`, or `N/A` when absent or not finite.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_peak_hour(hour: Option<f64>) -> String {
    match hour {
        Some(h) if h.is_finite() => format!("{:02}:00", h.trunc() as i64),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-45_000), "-45,000");
        assert_eq!(format_len(5000), "5,000");
    }

    #[test]
    fn counts_truncate() {
        assert_eq!(format_count(1500.9), "1,500");
        assert_eq!(format_count(f64::NAN), "0");
    }

    #[test]
    fn percentages_and_fixed() {
        assert_eq!(format_percent(0.25), "25.00%");
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_fixed(42.26, 1), "42.3");
        assert_eq!(format_fixed(1.0, 2), "1.00");
    }

    #[test]
    fn kilometers_keep_a_decimal() {
        assert_eq!(format_km(5.0), "5.0");
        assert_eq!(format_km(12.5), "12.5");
        assert_eq!(format_km(20.0), "20.0");
        assert_eq!(format_km(0.1 + 0.2), "0.3");
    }

    #[test]
    fn peak_hours() {
        assert_eq!(format_peak_hour(Some(8.0)), "08:00");
        assert_eq!(format_peak_hour(Some(18.7)), "18:00");
        assert_eq!(format_peak_hour(None), "N/A");
        assert_eq!(format_peak_hour(Some(f64::NAN)), "N/A");
    }
}
