//! Loose JSON field handling for request bodies written by the web client,
//! which sends numbers as strings at times and omits falsy flags.

use serde_json::Value;

/// JavaScript truthiness: `null`, `false`, `0`, `NaN` and `""` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A field counts as supplied unless it is JSON `null`.
pub fn is_present(value: &Value) -> bool {
    !value.is_null()
}

/// Integers, integral floats and integer strings; everything else is `None`.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Non-empty string content; numbers are rendered the way JavaScript would
/// stringify them.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_matches_javascript() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy}");
        }
        for truthy in [json!(true), json!(1), json!(-1), json!("0"), json!("false"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy}");
        }
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(as_integer(&json!(3)), Some(3));
        assert_eq!(as_integer(&json!(-3)), Some(-3));
        assert_eq!(as_integer(&json!(2.0)), Some(2));
        assert_eq!(as_integer(&json!(" 7 ")), Some(7));
        assert_eq!(as_integer(&json!(2.5)), None);
        assert_eq!(as_integer(&json!("2.5")), None);
        assert_eq!(as_integer(&json!(true)), None);
        assert_eq!(as_integer(&json!(null)), None);
    }

    #[test]
    fn text_coercion() {
        assert_eq!(as_text(&json!("Intro")).as_deref(), Some("Intro"));
        assert_eq!(as_text(&json!(12)).as_deref(), Some("12"));
        assert_eq!(as_text(&json!("")), None);
        assert_eq!(as_text(&json!(false)), None);
    }
}
