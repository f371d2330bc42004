//! Typed build diagnostics.
//!
//! Every degraded outcome of a run (a skipped record, a failed download, a
//! stale cache entry) is reported as a [`Diagnostic`] through the injected
//! [`DiagnosticsPort`], so callers can assert on outcomes instead of scraping
//! log output. The binary wires in [`crate::infra::diagnostics::TracingDiagnostics`].

use std::sync::Mutex;

use crate::app::ports::DiagnosticsPort;
use crate::domain::SourceReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Started { node_type: String },
    MissingCredentials,
    AuthFailed { reason: String },
    EmployeeListFailed { reason: String },
    EmployeesReceived { count: usize },
    RecordSkipped { index: usize, reason: String },
    FieldOmitted { record: String, field: String, reason: String },
    LabelCollision { record: String, field: String },
    NodeCreateFailed { node_id: String, reason: String },
    CacheReadFailed { key: String, reason: String },
    CacheWriteFailed { key: String, reason: String },
    StaleCacheEntry { key: String, artifact_id: String },
    AttachmentReused { node_id: String, artifact_id: String },
    AttachmentDownloaded { node_id: String, artifact_id: String },
    DownloadFailed { node_id: String, url: String, reason: String },
    LinkFailed { node_id: String, artifact_id: String, reason: String },
    TaskFailed { reason: String },
    Finished { report: SourceReport },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MissingCredentials | Diagnostic::TaskFailed { .. } => Severity::Error,
            Diagnostic::AuthFailed { .. }
            | Diagnostic::EmployeeListFailed { .. }
            | Diagnostic::RecordSkipped { .. }
            | Diagnostic::FieldOmitted { .. }
            | Diagnostic::LabelCollision { .. }
            | Diagnostic::NodeCreateFailed { .. }
            | Diagnostic::CacheReadFailed { .. }
            | Diagnostic::CacheWriteFailed { .. }
            | Diagnostic::DownloadFailed { .. }
            | Diagnostic::LinkFailed { .. } => Severity::Warn,
            Diagnostic::StaleCacheEntry { .. }
            | Diagnostic::AttachmentReused { .. }
            | Diagnostic::AttachmentDownloaded { .. } => Severity::Debug,
            Diagnostic::Started { .. }
            | Diagnostic::EmployeesReceived { .. }
            | Diagnostic::Finished { .. } => Severity::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Diagnostic::Started { node_type } => {
                format!("Starting Personio source ({} nodes)", node_type)
            }
            Diagnostic::MissingCredentials => {
                "Missing Personio API credentials (client_id / client_secret)".to_string()
            }
            Diagnostic::AuthFailed { reason } => {
                format!("There was an error retrieving the auth token: {}", reason)
            }
            Diagnostic::EmployeeListFailed { reason } => {
                format!("There was an error retrieving the employees list: {}", reason)
            }
            Diagnostic::EmployeesReceived { count } => format!("Received {} employee records", count),
            Diagnostic::RecordSkipped { index, reason } => {
                format!("Skipping employee record #{}: {}", index, reason)
            }
            Diagnostic::FieldOmitted { record, field, reason } => {
                format!("Omitting field '{}' of record {}: {}", field, record, reason)
            }
            Diagnostic::LabelCollision { record, field } => format!(
                "Field '{}' of record {} set more than once, keeping the last value",
                field, record
            ),
            Diagnostic::NodeCreateFailed { node_id, reason } => {
                format!("Failed to create node {}: {}", node_id, reason)
            }
            Diagnostic::CacheReadFailed { key, reason } => {
                format!("Cache read for {} failed, treating as miss: {}", key, reason)
            }
            Diagnostic::CacheWriteFailed { key, reason } => {
                format!("Cache write for {} failed: {}", key, reason)
            }
            Diagnostic::StaleCacheEntry { key, artifact_id } => format!(
                "Cached artifact {} for {} no longer exists, downloading again",
                artifact_id, key
            ),
            Diagnostic::AttachmentReused { node_id, artifact_id } => {
                format!("Reusing artifact {} for node {}", artifact_id, node_id)
            }
            Diagnostic::AttachmentDownloaded { node_id, artifact_id } => {
                format!("Downloaded artifact {} for node {}", artifact_id, node_id)
            }
            Diagnostic::DownloadFailed { node_id, url, reason } => {
                format!("Download of {} for node {} failed: {}", url, node_id, reason)
            }
            Diagnostic::LinkFailed { node_id, artifact_id, reason } => format!(
                "Linking artifact {} to node {} failed: {}",
                artifact_id, node_id, reason
            ),
            Diagnostic::TaskFailed { reason } => format!("Attachment task failed: {}", reason),
            Diagnostic::Finished { report } => format!(
                "Finished: {} nodes, {} skipped, {} downloaded, {} reused, {} failed",
                report.nodes_created,
                report.records_skipped,
                report.attachments_downloaded,
                report.attachments_reused,
                report.attachments_failed
            ),
        }
    }
}

/// Keeps every diagnostic in memory. Used by embedding hosts that surface
/// diagnostics themselves, and by tests.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Diagnostic) -> bool,
    {
        self.events().iter().filter(|d| predicate(d)).count()
    }
}

impl DiagnosticsPort for CollectingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
