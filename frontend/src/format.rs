//! Display formatting for backend numbers. Anything missing or non-finite
//! renders as `N/A`.

pub const MISSING: &str = "N/A";
pub const CURRENCY_SYMBOL: &str = "₹";

pub fn format_with_commas(value: i64) -> String {
    let is_negative = value < 0;
    let s = value.unsigned_abs().to_string().chars().rev().collect::<Vec<char>>();
    let mut out = Vec::new();
    for (i, ch) in s.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    let formatted: String = out.into_iter().rev().collect();
    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Fixed-point rendering, e.g. `fixed(Some(12.345), 2) == "12.35"`.
pub fn fixed(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", digits, v),
        _ => MISSING.to_string(),
    }
}

pub fn percent(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}%", digits, v),
        _ => MISSING.to_string(),
    }
}

/// Whole-rupee amount with thousands separators.
pub fn currency(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}{}", CURRENCY_SYMBOL, format_with_commas(v.round() as i64)),
        _ => MISSING.to_string(),
    }
}

pub fn text(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

/// Share of `part` in `whole` as a bar width, clamped to 0..=100.
pub fn bar_width(part: Option<f64>, whole: Option<f64>) -> f64 {
    match (part, whole) {
        (Some(p), Some(w)) if w > 0.0 && p.is_finite() && w.is_finite() => (p / w * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1000), "1,000");
        assert_eq!(format_with_commas(-1234567), "-1,234,567");
    }

    #[test]
    fn missing_numbers_render_na() {
        assert_eq!(fixed(None, 2), "N/A");
        assert_eq!(fixed(Some(f64::NAN), 2), "N/A");
        assert_eq!(percent(None, 1), "N/A");
        assert_eq!(currency(Some(f64::INFINITY)), "N/A");
        assert_eq!(text(Some("  ")), "N/A");
    }

    #[test]
    fn present_numbers_render() {
        assert_eq!(fixed(Some(7.256), 2), "7.26");
        assert_eq!(percent(Some(18.0), 1), "18.0%");
        assert_eq!(currency(Some(150000.4)), "₹150,000");
        assert_eq!(text(Some("Low")), "Low");
    }

    #[test]
    fn bar_width_is_clamped() {
        assert_eq!(bar_width(Some(25.0), Some(100.0)), 25.0);
        assert_eq!(bar_width(Some(250.0), Some(100.0)), 100.0);
        assert_eq!(bar_width(Some(10.0), Some(0.0)), 0.0);
        assert_eq!(bar_width(None, Some(100.0)), 0.0);
    }
}
