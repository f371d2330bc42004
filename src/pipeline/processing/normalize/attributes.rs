//! Typed view of the remote attribute objects.
//!
//! Personio wraps most attributes in a `{ "label": ..., "value": ... }`
//! descriptor, nests related objects as `{ "type": ..., "attributes": {...} }`
//! and sometimes sends bare primitives. Everything is parsed once into
//! [`RemoteRecord`] so flattening is a pure walk over a closed set of variants.

use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Text(String),
    Number(Number),
    Flag(bool),
    Nested(RemoteRecord),
    /// A shape the flattener does not map to a field (JSON arrays)
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `{ "label": ..., "value": ... }`
    Descriptor {
        label: Option<String>,
        value: AttributeValue,
    },
    /// A primitive or nested object keyed directly
    Bare(AttributeValue),
}

impl Attribute {
    pub fn value(&self) -> &AttributeValue {
        match self {
            Attribute::Descriptor { value, .. } => value,
            Attribute::Bare(value) => value,
        }
    }
}

/// Attributes in the order the map yielded them; later entries win on collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteRecord {
    pub attributes: Vec<(String, Attribute)>,
}

impl RemoteRecord {
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let attributes = map
            .iter()
            .map(|(key, raw)| (key.clone(), parse_attribute(raw)))
            .collect();
        Self { attributes }
    }

    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, attr)| attr)
    }

    /// The stable remote identifier, stringified. Only text and numbers count.
    pub fn identifier(&self, key: &str) -> Option<String> {
        match self.get(key)?.value() {
            AttributeValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            AttributeValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn parse_attribute(raw: &Value) -> Attribute {
    match raw {
        Value::Object(obj) if obj.contains_key("value") => Attribute::Descriptor {
            label: descriptor_label(obj),
            value: parse_value(&obj["value"]),
        },
        // A descriptor that arrived without its value
        Value::Object(obj) if obj.contains_key("label") && !obj.contains_key("attributes") => {
            Attribute::Descriptor {
                label: descriptor_label(obj),
                value: AttributeValue::Null,
            }
        }
        other => Attribute::Bare(parse_value(other)),
    }
}

fn descriptor_label(obj: &Map<String, Value>) -> Option<String> {
    obj.get("label")
        .and_then(|l| l.as_str())
        .map(|s| s.to_string())
}

fn parse_value(raw: &Value) -> AttributeValue {
    match raw {
        Value::Null => AttributeValue::Null,
        Value::String(s) => AttributeValue::Text(s.clone()),
        Value::Number(n) => AttributeValue::Number(n.clone()),
        Value::Bool(b) => AttributeValue::Flag(*b),
        Value::Array(_) => AttributeValue::Unsupported("list"),
        Value::Object(obj) => match obj.get("attributes") {
            Some(Value::Object(inner)) => AttributeValue::Nested(RemoteRecord::from_json_map(inner)),
            _ => AttributeValue::Nested(RemoteRecord::from_json_map(obj)),
        },
    }
}
