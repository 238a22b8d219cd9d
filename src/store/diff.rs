//! Field comparison for reconciliation
//!
//! Values scraped from listing pages are messy: the same price may arrive as
//! `"300000"`, `300000`, or `"300 000"`, and a missing value may surface as
//! `null`, an empty string, or a literal `"N/A"`. This module normalizes
//! both sides to a single missing sentinel and compares numerically whenever
//! both sides parse as numbers, so re-observations of an unchanged listing
//! never produce spurious diffs.

use serde_json::Value;

/// Dedicated listing columns, in schema order
pub const DEDICATED_FIELDS: [&str; 5] = [
    "title",
    "price",
    "description",
    "image_count",
    "primary_image_url",
];

/// Stringifies a scraped JSON value for storage and comparison
///
/// Numbers render without spurious decimals (`295000.0` becomes `295000`);
/// null renders as the missing sentinel (empty string).
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    format!("{}", f as i64)
                } else {
                    format!("{}", f)
                }
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// True when a stored or scraped string denotes "no value"
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
}

/// Collapses every missing-value spelling to one sentinel
pub fn normalize(value: &str) -> &str {
    if is_missing(value) {
        ""
    } else {
        value.trim()
    }
}

/// Type-aware inequality: numeric when both sides parse, else string
pub fn values_differ(old: &str, new: &str) -> bool {
    let old = normalize(old);
    let new = normalize(new);

    if old.is_empty() && new.is_empty() {
        return false;
    }

    if let (Ok(old_n), Ok(new_n)) = (parse_number(old), parse_number(new)) {
        return old_n != new_n;
    }

    old != new
}

/// Renders a value for a change entry or payload; missing becomes "N/A"
pub fn display_value(value: &str) -> String {
    let normalized = normalize(value);
    if normalized.is_empty() {
        "N/A".to_string()
    } else if let Ok(n) = parse_number(normalized) {
        if n.fract() == 0.0 {
            format!("{}", n as i64)
        } else {
            format!("{}", n)
        }
    } else {
        normalized.to_string()
    }
}

fn parse_number(value: &str) -> Result<f64, std::num::ParseFloatError> {
    // Tolerate thousands spacing and comma decimal separators
    value.replace(' ', "").replace(',', ".").parse::<f64>()
}
