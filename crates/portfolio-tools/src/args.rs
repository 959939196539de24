//! Lenient access to tool input.
//!
//! Tools are run with either query parameters (always strings) or a JSON
//! body (typed values), so every accessor accepts both forms.

use serde_json::{Map, Value};

/// Input passed to a tool handler.
#[derive(Clone, Debug, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Build from a JSON value. Anything but an object yields empty args.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// Build from query-string pairs, keeping the first value of each key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = Map::new();
        for (k, v) in pairs {
            values
                .entry(k.into())
                .or_insert_with(|| Value::String(v.into()));
        }
        Self { values }
    }

    /// String form of a value. Numbers and booleans are rendered; missing or
    /// null is empty.
    pub fn string(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Integer value. Numeric strings are parsed; anything else is `default`.
    pub fn int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Boolean value. `"true"` and `"1"` are true; other strings are false.
    pub fn bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true" || s == "1",
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_coercion() {
        let args = ToolArgs::from_value(json!({"a": "x", "b": 42, "c": true, "d": null}));
        assert_eq!(args.string("a"), "x");
        assert_eq!(args.string("b"), "42");
        assert_eq!(args.string("c"), "true");
        assert_eq!(args.string("d"), "");
        assert_eq!(args.string("missing"), "");
    }

    #[test]
    fn test_int_coercion() {
        let args = ToolArgs::from_value(json!({"n": 16, "s": "20", "f": 8.9, "bad": "abc"}));
        assert_eq!(args.int("n", 12), 16);
        assert_eq!(args.int("s", 12), 20);
        assert_eq!(args.int("f", 12), 8);
        assert_eq!(args.int("bad", 12), 12);
        assert_eq!(args.int("missing", 12), 12);
    }

    #[test]
    fn test_bool_coercion() {
        let args = ToolArgs::from_pairs([("a", "true"), ("b", "1"), ("c", "no")]);
        assert!(args.bool("a", false));
        assert!(args.bool("b", false));
        assert!(!args.bool("c", true));
        assert!(args.bool("missing", true));
    }

    #[test]
    fn test_from_pairs_keeps_first_value() {
        let args = ToolArgs::from_pairs([("text", "first"), ("text", "second")]);
        assert_eq!(args.string("text"), "first");
    }

    #[test]
    fn test_non_object_value_is_empty() {
        let args = ToolArgs::from_value(json!(["not", "an", "object"]));
        assert_eq!(args.string("text"), "");
    }
}
