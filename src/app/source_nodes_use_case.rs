use std::sync::Arc;
use tracing::{info, instrument};

use crate::app::attachment_sync_use_case::AttachmentSyncUseCase;
use crate::app::diagnostics::Diagnostic;
use crate::app::ports::{
    AuthPort, CachePort, DiagnosticsPort, EmployeeDirectoryPort, NodeFactory, NodeStorePort,
    RemoteFilePort,
};
use crate::config::{Credentials, SyncConfig};
use crate::domain::{EmployeeEntry, NormalizedNode, SourceReport};
use crate::error::{Result, SourceError};
use crate::metrics::SyncMetrics;
use crate::pipeline::processing::normalize::RecordNormalizer;

/// Every collaborator the sourcing run talks to.
#[derive(Clone)]
pub struct SourcePorts {
    pub auth: Arc<dyn AuthPort>,
    pub directory: Arc<dyn EmployeeDirectoryPort>,
    pub store: Arc<dyn NodeStorePort>,
    pub factory: Arc<dyn NodeFactory>,
    pub cache: Arc<dyn CachePort>,
    pub files: Arc<dyn RemoteFilePort>,
    pub diagnostics: Arc<dyn DiagnosticsPort>,
}

/// One build's worth of sourcing: auth, fetch, normalize, create nodes, sync
/// profile pictures.
pub struct SourceNodesUseCase {
    ports: SourcePorts,
    credentials: Option<Credentials>,
    sync: SyncConfig,
}

impl SourceNodesUseCase {
    pub fn new(ports: SourcePorts, credentials: Option<Credentials>, sync: SyncConfig) -> Self {
        Self {
            ports,
            credentials,
            sync,
        }
    }

    /// Only missing credentials fail the run; every other problem is reported
    /// as a diagnostic and the run continues with whatever data it has.
    #[instrument(skip(self), fields(node_type = %self.sync.node_type))]
    pub async fn run(&self) -> Result<SourceReport> {
        let diagnostics = self.ports.diagnostics.as_ref();
        diagnostics.emit(Diagnostic::Started {
            node_type: self.sync.node_type.clone(),
        });

        let Some(credentials) = self.credentials.clone() else {
            diagnostics.emit(Diagnostic::MissingCredentials);
            return Err(SourceError::Config(
                "missing Personio API credentials (client_id / client_secret)".to_string(),
            ));
        };

        let auth_header = match self.ports.auth.get_token(&credentials).await {
            Ok(header) => Some(header),
            Err(e) => {
                diagnostics.emit(Diagnostic::AuthFailed {
                    reason: e.to_string(),
                });
                None
            }
        };

        let entries = self.fetch_entries(auth_header.as_deref()).await;
        diagnostics.emit(Diagnostic::EmployeesReceived {
            count: entries.len(),
        });

        let normalizer = RecordNormalizer::new(
            self.ports.factory.clone(),
            &self.sync.node_type,
            &self.sync.attachment_field,
        );
        let outcome = normalizer.normalize(&entries, diagnostics);
        SyncMetrics::records_normalized(outcome.nodes.len());
        SyncMetrics::records_skipped(outcome.skipped);

        let created = self.create_nodes(outcome.nodes).await;

        let synchronizer = AttachmentSyncUseCase::new(
            self.ports.store.clone(),
            self.ports.cache.clone(),
            self.ports.files.clone(),
            self.ports.auth.clone(),
            Some(credentials),
            self.ports.diagnostics.clone(),
        );
        let summary = synchronizer.synchronize(&created).await;

        let report = SourceReport {
            records_received: entries.len(),
            nodes_created: created.len(),
            records_skipped: outcome.skipped,
            attachments_reused: summary.reused,
            attachments_downloaded: summary.downloaded,
            attachments_failed: summary.failed,
            stale_cache_entries: summary.stale_cache_entries,
        };
        info!(?report, "Personio sourcing complete");
        diagnostics.emit(Diagnostic::Finished {
            report: report.clone(),
        });
        Ok(report)
    }

    async fn fetch_entries(&self, auth_header: Option<&str>) -> Vec<EmployeeEntry> {
        match self.ports.directory.list_employees(auth_header).await {
            Ok(list) => list.into_entries(),
            Err(e) => {
                self.ports
                    .diagnostics
                    .emit(Diagnostic::EmployeeListFailed {
                        reason: e.to_string(),
                    });
                Vec::new()
            }
        }
    }

    /// Create record nodes before any attachment work starts. Nodes the store
    /// rejects are left out of attachment sync.
    async fn create_nodes(&self, nodes: Vec<NormalizedNode>) -> Vec<NormalizedNode> {
        let mut created = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.ports.store.create_node(node.to_content_node()).await {
                Ok(()) => created.push(node),
                Err(e) => self.ports.diagnostics.emit(Diagnostic::NodeCreateFailed {
                    node_id: node.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        created
    }
}
