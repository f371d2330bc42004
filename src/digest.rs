use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::app::ports::NodeFactory;

/// Hex sha256 over a canonical rendering of `value` (object keys sorted), so
/// the digest does not depend on the key order the API happened to send.
pub fn content_digest(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    sha256_hex(canonical.as_bytes())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Node ids are uuid v5 over a namespace derived from the plugin name, so the
/// same local key always maps to the same global id.
#[derive(Debug, Clone)]
pub struct Uuid5NodeFactory {
    namespace: Uuid,
}

impl Uuid5NodeFactory {
    pub fn new(plugin_name: &str) -> Self {
        Self {
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_OID, plugin_name.as_bytes()),
        }
    }
}

impl NodeFactory for Uuid5NodeFactory {
    fn make_node_id(&self, local_key: &str) -> String {
        Uuid::new_v5(&self.namespace, local_key.as_bytes()).to_string()
    }

    fn digest(&self, value: &Value) -> String {
        content_digest(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":[1,"z"]}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":[1,"z"],"y":2},"b":1}"#).unwrap();
        assert_eq!(content_digest(&a), content_digest(&b));
        assert_ne!(content_digest(&a), content_digest(&json!({"b": 2})));
        assert_eq!(content_digest(&a).len(), 64);
    }

    #[test]
    fn test_node_ids_are_stable_and_namespaced() {
        let factory = Uuid5NodeFactory::new("personio-source");
        let again = Uuid5NodeFactory::new("personio-source");
        let other = Uuid5NodeFactory::new("another-plugin");

        let id = factory.make_node_id("employee-1");
        assert_eq!(id, again.make_node_id("employee-1"));
        assert_ne!(id, factory.make_node_id("employee-2"));
        assert_ne!(id, other.make_node_id("employee-1"));
    }
}
