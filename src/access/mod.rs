//! Total accessors for provider data.
//!
//! Every read of host-provided data goes through these helpers so that a
//! missing provider, a partial payload, or a wrongly-typed field becomes an
//! ordinary value instead of a failure. None of these functions panic.

use serde_json::Value;

/// Return `value` when present, `fallback` otherwise.
///
/// Zero, `false`, and empty strings are present values.
pub fn with_default<T>(value: Option<T>, fallback: T) -> T {
    value.unwrap_or(fallback)
}

/// Whether an optional value carries data.
pub fn is_present<T>(value: Option<&T>) -> bool {
    value.is_some()
}

/// Coerce an untyped JSON value into a number.
///
/// Numbers pass through, numeric strings are parsed (a blank string is 0),
/// booleans map to 1/0. Null, absent values, arrays, objects, unparseable
/// strings, and non-finite results yield `fallback`.
pub fn safe_number(value: Option<&Value>, fallback: f64) -> f64 {
    let coerced = match value {
        None | Some(Value::Null) => return fallback,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => None,
    };

    match coerced {
        Some(n) if n.is_finite() => n,
        _ => fallback,
    }
}

/// Render an untyped JSON value as display text. Absent and null are empty.
pub fn safe_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Walk `path` through nested objects, returning `None` at the first gap.
pub fn safe_get<'a>(value: Option<&'a Value>, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value?, |current, key| current.get(*key))
        .filter(|v| !v.is_null())
}

/// Nested lookup with a numeric fallback.
pub fn safe_get_number(value: Option<&Value>, path: &[&str], fallback: f64) -> f64 {
    safe_number(safe_get(value, path), fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_default_uses_fallback_when_absent() {
        assert_eq!(with_default(None, 5), 5);
    }

    #[test]
    fn with_default_keeps_zero() {
        assert_eq!(with_default(Some(0), 5), 0);
        assert_eq!(with_default(Some(""), "x"), "");
        assert!(!with_default(Some(false), true));
    }

    #[test]
    fn is_present_reports_some() {
        assert!(is_present(Some(&0)));
        assert!(!is_present::<i32>(None));
    }

    #[test]
    fn safe_number_coercions() {
        assert_eq!(safe_number(Some(&json!(42.5)), 0.0), 42.5);
        assert_eq!(safe_number(Some(&json!("17")), 0.0), 17.0);
        assert_eq!(safe_number(Some(&json!(" 3.5 ")), 0.0), 3.5);
        assert_eq!(safe_number(Some(&json!("")), 9.0), 0.0);
        assert_eq!(safe_number(Some(&json!(true)), 0.0), 1.0);
        assert_eq!(safe_number(Some(&json!(false)), 7.0), 0.0);
    }

    #[test]
    fn safe_number_falls_back() {
        assert_eq!(safe_number(None, 3.0), 3.0);
        assert_eq!(safe_number(Some(&Value::Null), 3.0), 3.0);
        assert_eq!(safe_number(Some(&json!("abc")), 3.0), 3.0);
        assert_eq!(safe_number(Some(&json!([1])), 3.0), 3.0);
        assert_eq!(safe_number(Some(&json!({"a": 1})), 3.0), 3.0);
        assert_eq!(safe_number(Some(&json!("inf")), 3.0), 3.0);
    }

    #[test]
    fn safe_string_renders() {
        assert_eq!(safe_string(None), "");
        assert_eq!(safe_string(Some(&Value::Null)), "");
        assert_eq!(safe_string(Some(&json!("hi"))), "hi");
        assert_eq!(safe_string(Some(&json!(12))), "12");
    }

    #[test]
    fn safe_get_walks_nested_objects() {
        let v = json!({"data": {"managedWindow": {"tilingSize": 0.3}}});
        let size = safe_get(Some(&v), &["data", "managedWindow", "tilingSize"]);
        assert_eq!(size, Some(&json!(0.3)));
        assert_eq!(safe_get(Some(&v), &["data", "missing", "tilingSize"]), None);
        assert_eq!(safe_get(None, &["data"]), None);
    }

    #[test]
    fn safe_get_treats_null_leaf_as_absent() {
        let v = json!({"a": {"b": null}});
        assert_eq!(safe_get(Some(&v), &["a", "b"]), None);
        assert_eq!(safe_get_number(Some(&v), &["a", "b"], 4.0), 4.0);
    }
}
