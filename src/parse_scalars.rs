//! Scalar text to value conversions used by the primitive fields.

/// Literals accepted as `true`. Matching is case-sensitive.
pub(crate) const TRUE_LITERALS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "true", "True", "TRUE", "on", "On", "ON",
];

/// Literals accepted as `false`. Matching is case-sensitive.
pub(crate) const FALSE_LITERALS: &[&str] = &[
    "n", "N", "no", "No", "NO", "false", "False", "FALSE", "off", "Off", "OFF",
];

/// Parse a boolean literal (handles the "Norway problem" only when asked to).
///
/// With `strict` set, only `true` and `false` are accepted.
pub(crate) fn parse_bool(text: &str, strict: bool) -> Option<bool> {
    if strict {
        return match text {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
    }
    if TRUE_LITERALS.contains(&text) {
        Some(true)
    } else if FALSE_LITERALS.contains(&text) {
        Some(false)
    } else {
        None
    }
}

fn parse_digits_u128(digits: &str, radix: u32) -> Option<u128> {
    let mut val: u128 = 0;
    let mut saw = false;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let d = c.to_digit(radix)?;
        val = val.checked_mul(radix as u128)?;
        val = val.checked_add(d as u128)?;
        saw = true;
    }
    if saw { Some(val) } else { None }
}

/// Parse an integer literal: optional sign, `0x`/`0o`/`0b` radix prefixes and `_`
/// digit separators.
///
/// Returns `None` for anything else, including values outside the `i128` range.
pub(crate) fn parse_int(text: &str) -> Option<i128> {
    let t = text.trim();
    let (neg, rest) = match t.strip_prefix('+') {
        Some(r) => (false, r),
        None => match t.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, t),
        },
    };

    let (radix, digits) = if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16u32, r)
    } else if let Some(r) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8u32, r)
    } else if let Some(r) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2u32, r)
    } else {
        (10u32, rest)
    };
    // A separator may not lead.
    if digits.starts_with('_') {
        return None;
    }

    let mag = parse_digits_u128(digits, radix)?;
    if neg {
        // Magnitude of i128::MIN does not fit in i128.
        if mag == i128::MIN.unsigned_abs() {
            return Some(i128::MIN);
        }
        i128::try_from(mag).ok()?.checked_neg()
    } else {
        i128::try_from(mag).ok()
    }
}

/// Parse a floating point literal, including the YAML 1.2 `.inf`/`.nan` spellings.
///
/// Other spellings of the special values (`inf`, `infinity`, `NaN`) are rejected.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let t = text.trim();
    match t.to_ascii_lowercase().as_str() {
        ".nan" | "+.nan" | "-.nan" => Some(f64::NAN),
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        _ if t.contains(|c: char| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => None,
        _ => t.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_literals_are_case_sensitive() {
        assert_eq!(parse_bool("Yes", false), Some(true));
        assert_eq!(parse_bool("OFF", false), Some(false));
        assert_eq!(parse_bool("yEs", false), None);
        assert_eq!(parse_bool("yes", true), None);
        assert_eq!(parse_bool("false", true), Some(false));
    }

    #[test]
    fn int_prefixes_signs_and_separators() {
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("-0x1F"), Some(-31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("+0b101"), Some(5));
        assert_eq!(parse_int("-170141183460469231731687303715884105728"), Some(i128::MIN));
        assert_eq!(parse_int("12a"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("_1"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn float_special_values() {
        assert_eq!(parse_float("-.inf"), Some(f64::NEG_INFINITY));
        assert!(parse_float(".NaN").is_some_and(f64::is_nan));
        assert_eq!(parse_float("1.5e3"), Some(1500.0));
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("-Infinity"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("-2.5E-1"), Some(-0.25));
    }
}
