use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde_json::Value;

/// Composite identifier of a cached read: a resource name followed by any
/// number of parameters. Two keys are the same query when their parts are
/// deeply equal, regardless of object field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self(vec![Value::String(resource.to_string())])
    }

    /// Appends a parameter. Parameters that cannot be represented as JSON
    /// become `null`.
    pub fn with<T: Serialize>(mut self, part: T) -> Self {
        self.0.push(serde_json::to_value(part).unwrap_or(Value::Null));
        self
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    pub fn resource(&self) -> Option<&str> {
        self.0.first().and_then(Value::as_str)
    }

    /// True when `prefix`'s parts are the leading parts of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        prefix.0.len() <= self.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for part in &self.0 {
            hash_value(part, state);
        }
    }
}

// Must agree with `Value`'s `PartialEq`, which ignores object key order.
fn hash_value<H: Hasher>(v: &Value, state: &mut H) {
    match v {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            n.to_string().hash(state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            for (k, v) in fields {
                k.hash(state);
                hash_value(v, state);
            }
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}
