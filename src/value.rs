//! Dynamic values flowing through matchers
//!
//! Arguments, captures and results are `serde_json::Value`s. Equality is
//! strict: numbers of different representation and strings holding digits
//! never compare equal to each other.

pub use serde_json::Value;

/// Interpretation helpers for values returned by guards and predicates
pub trait ValueExt {
    /// Whether the value counts as a successful guard or predicate result
    fn is_truthy(&self) -> bool;

    /// Short type name used in diagnostics and errors
    fn type_name(&self) -> &'static str;
}

impl ValueExt for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i != 0
                } else if let Some(u) = n.as_u64() {
                    u != 0
                } else {
                    n.as_f64().map_or(true, |f| f != 0.0)
                }
            }
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "int",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Render a value compactly for diagnostics
pub(crate) fn describe(value: &Value) -> String {
    const MAX_LEN: usize = 64;

    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_LEN {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(MAX_LEN).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        let falsy = [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!("0"),
            json!([]),
            json!({}),
        ];
        for value in &falsy {
            assert!(!value.is_truthy(), "{} should be falsy", value);
        }

        let truthy = [
            json!(true),
            json!(-1),
            json!(0.5),
            json!("false"),
            json!([0]),
            json!({"a": null}),
        ];
        for value in &truthy {
            assert!(value.is_truthy(), "{} should be truthy", value);
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(json!(1).type_name(), "int");
        assert_eq!(json!(1.5).type_name(), "float");
        assert_eq!(json!("x").type_name(), "string");
        assert_eq!(json!(null).type_name(), "null");
    }

    #[test]
    fn test_strict_equality() {
        assert_ne!(json!(1), json!(1.0));
        assert_ne!(json!(1), json!("1"));
        assert_eq!(json!(42), Value::from(42i64));
    }

    #[test]
    fn test_describe_truncates() {
        let long = Value::String("x".repeat(200));
        let rendered = describe(&long);
        assert!(rendered.ends_with("..."));
        assert_eq!(rendered.chars().count(), 67);
    }
}
