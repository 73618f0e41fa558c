//! Price parsing helpers shared by both marketplaces.
//!
//! Storefront JSON mixes integer kopecks, decimal strings, and display text
//! such as `"1 299 ₽"` (with NBSP or thin-space grouping) or `"−68%"`.

use serde_json::Value;

/// Converts an integer amount in kopecks to rubles.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn kopecks_to_rubles(kopecks: u64) -> f64 {
    kopecks as f64 / 100.0
}

/// Extracts a decimal number from free text, treating `,` as the decimal
/// separator.
///
/// `"432,00 ₽"` → `432.0`, `"1 234,56"` → `1234.56`, `"N/A"` → `None`.
#[must_use]
pub fn extract_price_from_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Parses an Ozon display price such as `"1 299 ₽"` or `"2 490,50 ₽"`.
///
/// Currency sign and every kind of space are stripped first. If what remains
/// still does not parse, all digits are concatenated as a last resort.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| *c != '₽' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if let Ok(value) = stripped.parse::<f64>() {
        return Some(value);
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Parses a discount badge such as `"−68%"` or `"-15 %"` into its absolute
/// percentage.
#[must_use]
pub fn parse_discount_text(text: &str) -> Option<f64> {
    extract_price_from_text(text).map(f64::abs)
}

/// Discount of `current` relative to `original`, rounded to one decimal.
///
/// Only defined when `original > current > 0`.
#[must_use]
pub fn discount_percent(original: f64, current: f64) -> Option<f64> {
    if current > 0.0 && original > current {
        let pct = (original - current) / original * 100.0;
        Some((pct * 10.0).round() / 10.0)
    } else {
        None
    }
}

/// Reads a JSON number or numeric string as `f64`.
///
/// Seller API price fields arrive as either, depending on the endpoint version.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .or_else(|| parse_price_text(trimmed))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kopecks() {
        assert!((kopecks_to_rubles(123_456) - 1234.56).abs() < 1e-9);
        assert!(kopecks_to_rubles(0).abs() < f64::EPSILON);
    }

    #[test]
    fn extract_price_variants() {
        assert_eq!(extract_price_from_text("432,00 ₽"), Some(432.0));
        assert_eq!(extract_price_from_text("1 234,56"), Some(1234.56));
        assert_eq!(extract_price_from_text(""), None);
        assert_eq!(extract_price_from_text("N/A"), None);
    }

    #[test]
    fn parse_price_text_handles_nbsp_and_thin_space() {
        assert_eq!(parse_price_text("1\u{a0}299\u{a0}₽"), Some(1299.0));
        assert_eq!(parse_price_text("12\u{2009}990 ₽"), Some(12990.0));
        assert_eq!(parse_price_text("2 490,50 ₽"), Some(2490.5));
    }

    #[test]
    fn parse_price_text_falls_back_to_digits() {
        assert_eq!(parse_price_text("от 1 299 ₽"), Some(1299.0));
        assert_eq!(parse_price_text("цена"), None);
    }

    #[test]
    fn discount_badge() {
        assert_eq!(parse_discount_text("−68%"), Some(68.0));
        assert_eq!(parse_discount_text("-15 %"), Some(15.0));
        assert_eq!(parse_discount_text("скидка"), None);
    }

    #[test]
    fn discount_percent_rounding() {
        assert_eq!(discount_percent(3000.0, 990.0), Some(67.0));
        assert_eq!(discount_percent(999.0, 333.0), Some(66.7));
        assert_eq!(discount_percent(100.0, 100.0), None);
        assert_eq!(discount_percent(100.0, 0.0), None);
    }

    #[test]
    fn value_as_f64_accepts_numbers_and_strings() {
        assert_eq!(value_as_f64(&json!(1250)), Some(1250.0));
        assert_eq!(value_as_f64(&json!("1250.0000")), Some(1250.0));
        assert_eq!(value_as_f64(&json!("")), None);
        assert_eq!(value_as_f64(&json!(null)), None);
    }
}
