//! Typed, fallible accessors over a parsed JSON object.
//!
//! Feed payloads are heterogeneous vendor JSON; instead of scattering
//! type probes through the decoder, this wrapper exposes the handful of
//! extraction shapes the decoder needs. `null` is treated as absent
//! everywhere.

use serde_json::{Map, Value};

/// Borrowed view over one JSON object.
#[derive(Debug, Clone, Copy)]
pub struct JsonObject<'a>(&'a Map<String, Value>);

impl<'a> JsonObject<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    /// The object as a top-level value, if it is one.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self)
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        match self.0.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    /// Key exists with a non-null value.
    pub fn has(&self, key: &str) -> bool {
        self.present(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.present(key)?.as_str()
    }

    /// Integer field; accepts a native number or a numeric string.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.present(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float field; accepts a native number or a numeric string.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.present(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.present(key)?.as_bool()
    }

    pub fn get_array(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.present(key)?.as_array()
    }

    /// Primitive field rendered for display: strings pass through,
    /// numbers and booleans are formatted, objects and arrays yield None.
    pub fn display_string(&self, key: &str) -> Option<String> {
        value_display(self.present(key)?)
    }

    /// First present key from an ordered candidate list, as a display
    /// string. Used for the vendor-specific field-name priority chains.
    pub fn first_display(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.display_string(k))
    }

    /// First present key from an ordered candidate list, as an integer.
    pub fn first_i64(&self, keys: &[&str]) -> Option<i64> {
        keys.iter().find_map(|k| self.get_i64(k))
    }

    /// Iterate over (key, value) pairs in the object.
    pub fn iter(&self) -> impl Iterator<Item = (&'a String, &'a Value)> {
        self.0.iter()
    }
}

/// Render a primitive JSON value for display. Composite values and null
/// yield None.
pub fn value_display(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_null_is_absent() {
        let v = obj(r#"{"a": null, "b": 1}"#);
        let o = JsonObject::from_value(&v).unwrap();
        assert!(!o.has("a"));
        assert!(o.has("b"));
        assert_eq!(o.get_i64("a"), None);
    }

    #[test]
    fn test_numeric_string_coercion() {
        let v = obj(r#"{"earfcn": "1300", "pci": 52, "bad": "x"}"#);
        let o = JsonObject::from_value(&v).unwrap();
        assert_eq!(o.get_i64("earfcn"), Some(1300));
        assert_eq!(o.get_i64("pci"), Some(52));
        assert_eq!(o.get_i64("bad"), None);
    }

    #[test]
    fn test_priority_chain_first_present_wins() {
        let v = obj(r#"{"earfcn": 1300, "arfcn": 42}"#);
        let o = JsonObject::from_value(&v).unwrap();
        assert_eq!(o.first_i64(&["nrarfcn", "earfcn", "arfcn"]), Some(1300));
        assert_eq!(o.first_display(&["nrarfcn", "earfcn", "arfcn"]).unwrap(), "1300");
    }

    #[test]
    fn test_display_skips_composites() {
        let v = obj(r#"{"n": -85, "f": 12.5, "b": true, "o": {}, "l": []}"#);
        let o = JsonObject::from_value(&v).unwrap();
        assert_eq!(o.display_string("n").unwrap(), "-85");
        assert_eq!(o.display_string("f").unwrap(), "12.5");
        assert_eq!(o.display_string("b").unwrap(), "true");
        assert_eq!(o.display_string("o"), None);
        assert_eq!(o.display_string("l"), None);
    }
}
