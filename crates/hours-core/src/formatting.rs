/// Format a floating-point number with a fixed number of decimal places and
/// the given decimal separator.
///
/// # Examples
///
/// ```
/// use hours_core::formatting::format_decimal;
///
/// assert_eq!(format_decimal(3.5, 2, ','), "3,50");
/// assert_eq!(format_decimal(12.0, 1, '.'), "12.0");
/// assert_eq!(format_decimal(7.0, 0, ','), "7");
/// ```
pub fn format_decimal(value: f64, decimals: usize, separator: char) -> String {
    let formatted = format!("{:.prec$}", value, prec = decimals);
    if separator == '.' {
        formatted
    } else {
        formatted.replacen('.', &separator.to_string(), 1)
    }
}

/// Format an hour total the way volunteer reports are read locally:
/// decimal comma, trailing zeros and a bare separator removed.
///
/// # Examples
///
/// ```
/// use hours_core::formatting::format_hours;
///
/// assert_eq!(format_hours(3.0), "3");
/// assert_eq!(format_hours(4.5), "4,5");
/// assert_eq!(format_hours(2.25), "2,25");
/// assert_eq!(format_hours(1.0 / 3.0), "0,33");
/// ```
pub fn format_hours(hours: f64) -> String {
    let fixed = format_decimal(hours, 2, ',');
    let trimmed = fixed.trim_end_matches('0').trim_end_matches(',');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Coverage fraction such as `"3/5"`.
pub fn format_ratio(part: usize, whole: u32) -> String {
    format!("{}/{}", part, whole)
}

/// Compute `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` when `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    ((part / whole) * 100.0 * factor).round() / factor
}

// ── Tests ──────────────────────────────────────────────────────────────────────
