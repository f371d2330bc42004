use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::app::diagnostics::Diagnostic;
use crate::app::ports::{
    AuthPort, CachePort, DiagnosticsPort, DownloadRequest, NodeStorePort, RemoteFilePort,
};
use crate::config::Credentials;
use crate::domain::{attachment_cache_key, NormalizedNode};
use crate::metrics::SyncMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentOutcome {
    /// Cached artifact still existed; touched and linked without downloading
    Reused,
    Downloaded,
    /// Left without an attachment (download or link failed)
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: AttachmentOutcome,
    /// A cache entry existed but its artifact was gone
    pub stale_cache_entry: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub reused: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub stale_cache_entries: usize,
}

impl SyncSummary {
    fn record(&mut self, resolution: Resolution) {
        match resolution.outcome {
            AttachmentOutcome::Reused => self.reused += 1,
            AttachmentOutcome::Downloaded => self.downloaded += 1,
            AttachmentOutcome::Failed => self.failed += 1,
        }
        if resolution.stale_cache_entry {
            self.stale_cache_entries += 1;
        }
    }
}

/// Makes sure every node with an attachment URL ends up with exactly one
/// linked artifact, reusing the artifact from a previous build when the cache
/// still points at a live node.
#[derive(Clone)]
pub struct AttachmentSyncUseCase {
    store: Arc<dyn NodeStorePort>,
    cache: Arc<dyn CachePort>,
    files: Arc<dyn RemoteFilePort>,
    auth: Arc<dyn AuthPort>,
    credentials: Option<Credentials>,
    diagnostics: Arc<dyn DiagnosticsPort>,
}

impl AttachmentSyncUseCase {
    pub fn new(
        store: Arc<dyn NodeStorePort>,
        cache: Arc<dyn CachePort>,
        files: Arc<dyn RemoteFilePort>,
        auth: Arc<dyn AuthPort>,
        credentials: Option<Credentials>,
        diagnostics: Arc<dyn DiagnosticsPort>,
    ) -> Self {
        Self {
            store,
            cache,
            files,
            auth,
            credentials,
            diagnostics,
        }
    }

    /// Resolve attachments for all nodes concurrently and wait for every one
    /// of them to settle. Failures stay local to their node.
    #[instrument(skip(self, nodes), fields(nodes = nodes.len()))]
    pub async fn synchronize(&self, nodes: &[NormalizedNode]) -> SyncSummary {
        let mut tasks = JoinSet::new();
        for node in nodes {
            let Some(url) = node.attachment_url.clone() else {
                continue;
            };
            let worker = self.clone();
            let node_id = node.id.clone();
            tasks.spawn(async move { worker.resolve(&node_id, &url).await });
        }

        let mut summary = SyncSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(resolution) => summary.record(resolution),
                Err(e) => {
                    SyncMetrics::attachment_failed();
                    self.diagnostics.emit(Diagnostic::TaskFailed {
                        reason: e.to_string(),
                    });
                    summary.failed += 1;
                }
            }
        }

        debug!(?summary, "Attachment sync settled");
        summary
    }

    /// Per-node protocol: cache lookup, liveness check, download on miss, link.
    pub async fn resolve(&self, node_id: &str, url: &str) -> Resolution {
        let key = attachment_cache_key(node_id);
        let mut stale_cache_entry = false;

        if let Some(artifact_id) = self.cached_artifact(&key).await {
            if self.store.get_node(&artifact_id).await.is_some() {
                self.store.touch_node(&artifact_id).await;
                SyncMetrics::cache_hit();
                self.diagnostics.emit(Diagnostic::AttachmentReused {
                    node_id: node_id.to_string(),
                    artifact_id: artifact_id.clone(),
                });
                let outcome = self
                    .link(node_id, &artifact_id, AttachmentOutcome::Reused)
                    .await;
                return Resolution {
                    outcome,
                    stale_cache_entry,
                };
            }

            stale_cache_entry = true;
            SyncMetrics::cache_stale();
            self.diagnostics.emit(Diagnostic::StaleCacheEntry {
                key: key.clone(),
                artifact_id,
            });
        }

        let request = DownloadRequest {
            url: url.to_string(),
            auth_header: self.fresh_auth_header().await,
            parent_node_id: node_id.to_string(),
        };

        let outcome = match self.files.download(request).await {
            Ok(artifact) => {
                SyncMetrics::download_success();
                if let Err(e) = self.cache.set(&key, &artifact.id).await {
                    self.diagnostics.emit(Diagnostic::CacheWriteFailed {
                        key: key.clone(),
                        reason: e.to_string(),
                    });
                }
                self.diagnostics.emit(Diagnostic::AttachmentDownloaded {
                    node_id: node_id.to_string(),
                    artifact_id: artifact.id.clone(),
                });
                self.link(node_id, &artifact.id, AttachmentOutcome::Downloaded)
                    .await
            }
            Err(e) => {
                SyncMetrics::download_error();
                SyncMetrics::attachment_failed();
                self.diagnostics.emit(Diagnostic::DownloadFailed {
                    node_id: node_id.to_string(),
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                AttachmentOutcome::Failed
            }
        };

        Resolution {
            outcome,
            stale_cache_entry,
        }
    }

    async fn cached_artifact(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                self.diagnostics.emit(Diagnostic::CacheReadFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Tokens expire, so every download asks for a new one. Without
    /// credentials or on auth failure the download goes out unauthenticated.
    async fn fresh_auth_header(&self) -> Option<String> {
        let credentials = self.credentials.as_ref()?;
        match self.auth.get_token(credentials).await {
            Ok(header) => Some(header),
            Err(e) => {
                self.diagnostics.emit(Diagnostic::AuthFailed {
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    async fn link(
        &self,
        node_id: &str,
        artifact_id: &str,
        on_success: AttachmentOutcome,
    ) -> AttachmentOutcome {
        match self
            .store
            .create_parent_child_link(node_id, artifact_id)
            .await
        {
            Ok(()) => {
                SyncMetrics::link_created();
                on_success
            }
            Err(e) => {
                SyncMetrics::attachment_failed();
                self.diagnostics.emit(Diagnostic::LinkFailed {
                    node_id: node_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                    reason: e.to_string(),
                });
                AttachmentOutcome::Failed
            }
        }
    }
}
