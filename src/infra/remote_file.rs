use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::app::ports::{DownloadRequest, NodeFactory, NodeStorePort, RemoteFilePort};
use crate::constants::{FILE_NODE_TYPE, REMOTE_FILE_KEY_PREFIX};
use crate::domain::{ContentNode, NodeInternal};
use crate::error::{Result, SourceError};
use crate::gateway::cas_fs::{write_cas, CasObject};

/// Downloads remote files into the local CAS tree and registers each one as
/// a `File` node owned by the requesting record.
pub struct ReqwestRemoteFiles {
    client: reqwest::Client,
    files_root: PathBuf,
    factory: Arc<dyn NodeFactory>,
    store: Arc<dyn NodeStorePort>,
}

impl ReqwestRemoteFiles {
    pub fn new(
        files_root: PathBuf,
        factory: Arc<dyn NodeFactory>,
        store: Arc<dyn NodeStorePort>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            files_root,
            factory,
            store,
        }
    }
}

/// The node describing a downloaded blob.
pub fn artifact_node(
    factory: &dyn NodeFactory,
    request: &DownloadRequest,
    object: &CasObject,
    content_type: &str,
) -> ContentNode {
    ContentNode {
        // One file node per owner, even when several records share a URL
        id: factory.make_node_id(&format!(
            "{}{}-{}",
            REMOTE_FILE_KEY_PREFIX, request.parent_node_id, request.url
        )),
        parent: Some(request.parent_node_id.clone()),
        children: Vec::new(),
        internal: NodeInternal {
            node_type: FILE_NODE_TYPE.to_string(),
            content_digest: object.sha256_hex.clone(),
        },
        content: json!({
            "url": request.url,
            "payload_ref": object.reference,
            "absolute_path": object.path.to_string_lossy(),
            "content_type": content_type,
            "size": object.size,
            "fetched_at": Utc::now().to_rfc3339(),
        }),
    }
}

#[async_trait]
impl RemoteFilePort for ReqwestRemoteFiles {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn download(&self, request: DownloadRequest) -> Result<ContentNode> {
        let mut http = self.client.get(&request.url);
        if let Some(header) = &request.auth_header {
            http = http.header(AUTHORIZATION, header);
        }
        let resp = http.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Api {
                message: format!("download of {} returned {}", request.url, status),
            });
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await?;

        let object = write_cas(&self.files_root, &bytes)?;
        let node = artifact_node(self.factory.as_ref(), &request, &object, &content_type);
        self.store.create_node(node.clone()).await?;
        debug!(artifact_id = %node.id, bytes = object.size, "Materialized remote file");
        Ok(node)
    }
}
