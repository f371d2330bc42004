//! Record normalization: remote employee entries -> [`NormalizedNode`]s.

pub mod attributes;
pub mod label;

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::app::diagnostics::Diagnostic;
use crate::app::ports::{DiagnosticsPort, NodeFactory};
use crate::constants::{EMPLOYEE_KEY_PREFIX, IDENTIFIER_FIELD};
use crate::domain::{EmployeeEntry, FieldMap, FieldValue, NormalizedNode};

pub use attributes::{Attribute, AttributeValue, RemoteRecord};
pub use label::clean_label;

/// Something that went wrong with a single field while flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenIssue {
    /// Two attributes cleaned to the same name; the later one was kept
    Collision { field: String },
    Unsupported { field: String, shape: &'static str },
    EmptyName { raw: String },
}

/// Flatten one record into cleaned field names.
///
/// Nulls are dropped, numbers and flags become strings, nested records become
/// nested maps named after their cleaned label. Pure; issues are returned, not
/// logged.
pub fn flatten(record: &RemoteRecord) -> (FieldMap, Vec<FlattenIssue>) {
    let mut issues = Vec::new();
    let fields = flatten_into(record, "", &mut issues);
    (fields, issues)
}

fn flatten_into(record: &RemoteRecord, path: &str, issues: &mut Vec<FlattenIssue>) -> FieldMap {
    let mut fields = FieldMap::new();

    for (key, attribute) in &record.attributes {
        // Nested values are named by their label unless it cleans to nothing
        let (name_source, value) = match attribute {
            Attribute::Descriptor {
                label: Some(label),
                value: value @ AttributeValue::Nested(_),
            } if !clean_label(label).is_empty() => (label.as_str(), value),
            other => (key.as_str(), other.value()),
        };

        let name = clean_label(name_source);
        if name.is_empty() {
            if !matches!(value, AttributeValue::Null) {
                issues.push(FlattenIssue::EmptyName {
                    raw: qualified(path, name_source),
                });
            }
            continue;
        }

        let flattened = match value {
            AttributeValue::Null => None,
            AttributeValue::Text(s) => Some(FieldValue::Text(s.clone())),
            AttributeValue::Number(n) => Some(FieldValue::Text(n.to_string())),
            AttributeValue::Flag(b) => Some(FieldValue::Text(b.to_string())),
            AttributeValue::Nested(inner) => Some(FieldValue::Nested(flatten_into(
                inner,
                &qualified(path, &name),
                issues,
            ))),
            AttributeValue::Unsupported(shape) => {
                issues.push(FlattenIssue::Unsupported {
                    field: qualified(path, &name),
                    shape,
                });
                None
            }
        };

        if let Some(field) = flattened {
            if fields.insert(name.clone(), field).is_some() {
                issues.push(FlattenIssue::Collision {
                    field: qualified(path, &name),
                });
            }
        }
    }

    fields
}

fn qualified(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Result of normalizing a batch: the nodes, plus how many entries were dropped.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub nodes: Vec<NormalizedNode>,
    pub skipped: usize,
}

pub struct RecordNormalizer {
    factory: Arc<dyn NodeFactory>,
    node_type: String,
    attachment_field: String,
}

impl RecordNormalizer {
    pub fn new(factory: Arc<dyn NodeFactory>, node_type: &str, attachment_field: &str) -> Self {
        Self {
            factory,
            node_type: node_type.to_string(),
            attachment_field: clean_label(attachment_field),
        }
    }

    /// Normalize every entry. Entries without attributes or without a usable
    /// identifier are skipped with a diagnostic; the rest of the batch continues.
    pub fn normalize(
        &self,
        entries: &[EmployeeEntry],
        diagnostics: &dyn DiagnosticsPort,
    ) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome::default();

        for (index, entry) in entries.iter().enumerate() {
            let Some(raw) = entry.attributes.as_ref() else {
                diagnostics.emit(Diagnostic::RecordSkipped {
                    index,
                    reason: "record has no attributes".to_string(),
                });
                outcome.skipped += 1;
                continue;
            };

            let record = RemoteRecord::from_json_map(raw);
            let Some(source_id) = record.identifier(IDENTIFIER_FIELD) else {
                diagnostics.emit(Diagnostic::RecordSkipped {
                    index,
                    reason: format!("missing identifier '{}'", IDENTIFIER_FIELD),
                });
                outcome.skipped += 1;
                continue;
            };

            let (fields, issues) = flatten(&record);
            for issue in issues {
                diagnostics.emit(issue_diagnostic(&source_id, issue));
            }

            let attachment_url = fields
                .get(&self.attachment_field)
                .and_then(FieldValue::as_text)
                .map(|s| s.to_string());

            let node = NormalizedNode {
                id: self
                    .factory
                    .make_node_id(&format!("{}{}", EMPLOYEE_KEY_PREFIX, source_id)),
                source_id,
                node_type: self.node_type.clone(),
                fields,
                attachment_url,
                content_digest: self.factory.digest(&Value::Object(raw.clone())),
            };
            debug!(node_id = %node.id, employee_id = %node.source_id, "Normalized employee");
            outcome.nodes.push(node);
        }

        outcome
    }
}

fn issue_diagnostic(record: &str, issue: FlattenIssue) -> Diagnostic {
    match issue {
        FlattenIssue::Collision { field } => Diagnostic::LabelCollision {
            record: record.to_string(),
            field,
        },
        FlattenIssue::Unsupported { field, shape } => Diagnostic::FieldOmitted {
            record: record.to_string(),
            field,
            reason: format!("unsupported {} value", shape),
        },
        FlattenIssue::EmptyName { raw } => Diagnostic::FieldOmitted {
            record: record.to_string(),
            field: raw,
            reason: "name is empty after cleaning".to_string(),
        },
    }
}
