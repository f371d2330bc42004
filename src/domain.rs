//! Data shapes shared between the normalizer, the synchronizer and the adapters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::constants::PROFILE_PICTURE_CACHE_PREFIX;

/// Cleaned field name -> flattened value
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A flattened field: either text or a nested mapping of further fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Nested(FieldMap),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&FieldMap> {
        match self {
            FieldValue::Nested(m) => Some(m),
            FieldValue::Text(_) => None,
        }
    }
}

/// The canonical record produced for one remote employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedNode {
    /// Global node id, derived only from the remote identifier
    pub id: String,
    /// The remote identifier, stringified
    pub source_id: String,
    pub node_type: String,
    pub fields: FieldMap,
    pub attachment_url: Option<String>,
    /// Digest of the raw remote attributes
    pub content_digest: String,
}

impl NormalizedNode {
    pub fn cache_key(&self) -> String {
        attachment_cache_key(&self.id)
    }

    /// The node-store representation of this record.
    pub fn to_content_node(&self) -> ContentNode {
        let mut content = Map::new();
        content.insert(
            "employee_id".to_string(),
            Value::String(self.source_id.clone()),
        );
        for (name, value) in &self.fields {
            content.insert(name.clone(), field_to_json(value));
        }
        ContentNode {
            id: self.id.clone(),
            parent: None,
            children: Vec::new(),
            internal: NodeInternal {
                node_type: self.node_type.clone(),
                content_digest: self.content_digest.clone(),
            },
            content: Value::Object(content),
        }
    }
}

pub fn attachment_cache_key(node_id: &str) -> String {
    format!("{}{}", PROFILE_PICTURE_CACHE_PREFIX, node_id)
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Nested(m) => Value::Object(
            m.iter()
                .map(|(k, v)| (k.clone(), field_to_json(v)))
                .collect(),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInternal {
    #[serde(rename = "type")]
    pub node_type: String,
    pub content_digest: String,
}

/// A unit of content in the host's content graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    pub internal: NodeInternal,
    #[serde(default)]
    pub content: Value,
}

/// Response body of the employee list endpoint. An absent `data` member means
/// zero employees.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmployeeList {
    #[serde(default)]
    pub data: Option<Vec<EmployeeEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmployeeEntry {
    #[serde(rename = "type", default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

impl EmployeeList {
    pub fn into_entries(self) -> Vec<EmployeeEntry> {
        self.data.unwrap_or_default()
    }
}

/// What one sourcing run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub records_received: usize,
    pub nodes_created: usize,
    pub records_skipped: usize,
    pub attachments_reused: usize,
    pub attachments_downloaded: usize,
    pub attachments_failed: usize,
    pub stale_cache_entries: usize,
}
