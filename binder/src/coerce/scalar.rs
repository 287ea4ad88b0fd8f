//! Scalar conversions behind weak coercion

use super::{CoercionError, CoercionMode};
use crate::value::Value;

const EXPECTED_BOOL: &str = "a boolean";
const EXPECTED_INTEGER: &str = "an integer";
const EXPECTED_FLOAT: &str = "a float";
const EXPECTED_STRING: &str = "a string";

/// In weak mode a list holding exactly one element stands in for that element
pub(super) fn unwrap_singleton(value: Value, mode: CoercionMode) -> Value {
    match value {
        Value::List(mut items) if mode.is_weak() && items.len() == 1 => items
            .pop()
            .map_or(Value::Null, |item| unwrap_singleton(item, mode)),
        other => other,
    }
}

pub(super) fn to_bool(value: Value, mode: CoercionMode) -> Result<bool, CoercionError> {
    let weak = mode.is_weak();
    match unwrap_singleton(value, mode) {
        Value::Bool(b) => Ok(b),
        Value::Int(n) if weak => Ok(n != 0),
        Value::UInt(n) if weak => Ok(n != 0),
        Value::Float(f) if weak => Ok(f != 0.0),
        Value::Str(s) if weak => {
            if s.is_empty() {
                return Ok(false);
            }
            parse_bool(&s).ok_or_else(|| CoercionError::unparsable(&s, EXPECTED_BOOL))
        }
        other => Err(CoercionError::invalid_type(&other, EXPECTED_BOOL)),
    }
}

pub(super) fn to_integer(value: Value, mode: CoercionMode) -> Result<i128, CoercionError> {
    let weak = mode.is_weak();
    match unwrap_singleton(value, mode) {
        Value::Int(n) => Ok(i128::from(n)),
        Value::UInt(n) => Ok(i128::from(n)),
        Value::Float(f) => float_to_integer(f, mode),
        Value::Bool(b) if weak => Ok(i128::from(b)),
        Value::Str(s) if weak => {
            parse_int(&s).ok_or_else(|| CoercionError::unparsable(&s, EXPECTED_INTEGER))
        }
        other => Err(CoercionError::invalid_type(&other, EXPECTED_INTEGER)),
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "integers are widened to floats the same way a float literal would be"
)]
pub(super) fn to_float(value: Value, mode: CoercionMode) -> Result<f64, CoercionError> {
    let weak = mode.is_weak();
    match unwrap_singleton(value, mode) {
        Value::Float(f) => Ok(f),
        Value::Int(n) => Ok(n as f64),
        Value::UInt(n) => Ok(n as f64),
        Value::Bool(b) if weak => Ok(if b { 1.0 } else { 0.0 }),
        Value::Str(s) if weak => {
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .map_err(|_| CoercionError::unparsable(&s, EXPECTED_FLOAT))
        }
        other => Err(CoercionError::invalid_type(&other, EXPECTED_FLOAT)),
    }
}

pub(super) fn to_text(value: Value, mode: CoercionMode) -> Result<String, CoercionError> {
    let weak = mode.is_weak();
    match unwrap_singleton(value, mode) {
        Value::Str(s) => Ok(s),
        Value::Bool(b) if weak => Ok(if b { "1" } else { "0" }.to_string()),
        Value::Int(n) if weak => Ok(n.to_string()),
        Value::UInt(n) if weak => Ok(n.to_string()),
        Value::Float(f) if weak => Ok(f.to_string()),
        other => Err(CoercionError::invalid_type(&other, EXPECTED_STRING)),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "range is checked before the cast and the fraction is dropped on purpose"
)]
fn float_to_integer(f: f64, mode: CoercionMode) -> Result<i128, CoercionError> {
    // 2^127, the first magnitude outside i128
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

    if !f.is_finite() || f.trunc() >= LIMIT || f.trunc() < -LIMIT {
        return Err(CoercionError::out_of_range(f, EXPECTED_INTEGER));
    }
    if !mode.is_weak() && f.fract() != 0.0 {
        return Err(CoercionError::unparsable(&f.to_string(), EXPECTED_INTEGER));
    }
    Ok(f.trunc() as i128)
}

/// Parse the textual booleans `1 t T TRUE true True` and `0 f F FALSE false False`
pub(super) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse an integer with optional sign and `0x`/`0o`/`0b` prefix.
///
/// Underscores are accepted between digits of prefixed literals. The empty string
/// parses as zero.
pub(super) fn parse_int(s: &str) -> Option<i128> {
    if s.is_empty() {
        return Some(0);
    }

    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = match unsigned.get(..2) {
        Some("0x" | "0X") => (16, unsigned[2..].replace('_', "")),
        Some("0o" | "0O") => (8, unsigned[2..].replace('_', "")),
        Some("0b" | "0B") => (2, unsigned[2..].replace('_', "")),
        _ => (10, unsigned.to_string()),
    };

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    // `i128::MIN` has no positive counterpart
    let magnitude = u128::from_str_radix(&digits, radix).ok()?;
    if negative {
        0_i128.checked_sub_unsigned(magnitude)
    } else {
        i128::try_from(magnitude).ok()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "tests")]

    use super::*;

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int("23"), Some(23));
        assert_eq!(parse_int("-23"), Some(-23));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("-0b101"), Some(-5));
        assert_eq!(parse_int("0x_ff_ff"), Some(0xffff));
        assert_eq!(parse_int("007"), Some(7));
        assert_eq!(parse_int(""), Some(0));
    }

    #[test]
    fn test_parse_int_full_i128_range() {
        assert_eq!(
            parse_int("-170141183460469231731687303715884105728"),
            Some(i128::MIN)
        );
        assert_eq!(
            parse_int("170141183460469231731687303715884105727"),
            Some(i128::MAX)
        );
        assert_eq!(parse_int("170141183460469231731687303715884105728"), None);
        assert_eq!(parse_int("-170141183460469231731687303715884105729"), None);
        assert_eq!(parse_int("-0x80000000000000000000000000000000"), Some(i128::MIN));
    }

    #[test]
    fn test_parse_int_rejects_garbage() {
        for input in ["aaa", "1.5", "--5", "+-5", "0x", "-", "1_000", " 1"] {
            assert_eq!(parse_int(input), None, "{input:?} should not parse");
        }
    }

    #[test]
    fn test_parse_bool_forms() {
        for input in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(input), Some(true));
        }
        for input in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(input), Some(false));
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("tRUE"), None);
    }

    #[test]
    fn test_weak_scalar_conversions() {
        let weak = CoercionMode::Weak;
        assert!(to_bool(Value::from("true"), weak).unwrap());
        assert!(!to_bool(Value::from(""), weak).unwrap());
        assert!(to_bool(Value::from(2), weak).unwrap());
        assert_eq!(to_integer(Value::from(true), weak).unwrap(), 1);
        assert_eq!(to_integer(Value::from(3.9), weak).unwrap(), 3);
        assert_eq!(to_text(Value::from(false), weak).unwrap(), "0");
        assert_eq!(to_text(Value::from(1.5), weak).unwrap(), "1.5");
        assert_eq!(to_text(Value::from(42_u64), weak).unwrap(), "42");
        assert!((to_float(Value::from("2.5"), weak).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_singleton_lists_unwrap_in_weak_mode_only() {
        let single = || Value::from(vec!["23"]);
        assert_eq!(to_integer(single(), CoercionMode::Weak).unwrap(), 23);
        assert!(to_integer(single(), CoercionMode::Strict).is_err());
    }

    #[test]
    fn test_strict_refuses_cross_kind_conversions() {
        let strict = CoercionMode::Strict;
        assert!(to_integer(Value::from("23"), strict).is_err());
        assert!(to_bool(Value::from(1), strict).is_err());
        assert!(to_text(Value::from(1), strict).is_err());
        assert!(to_integer(Value::from(2.5), strict).is_err());
        assert_eq!(to_integer(Value::from(2.0), strict).unwrap(), 2);
    }

    #[test]
    fn test_float_to_integer_bounds() {
        assert!(to_integer(Value::from(f64::NAN), CoercionMode::Weak).is_err());
        assert!(to_integer(Value::from(f64::INFINITY), CoercionMode::Weak).is_err());
        assert!(to_integer(Value::from(1e40), CoercionMode::Weak).is_err());
    }
}
