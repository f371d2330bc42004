use async_trait::async_trait;
use serde_json::Value;

use crate::app::diagnostics::Diagnostic;
use crate::config::Credentials;
use crate::domain::{ContentNode, EmployeeList};
use crate::error::Result;

// Remote API ports
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchange client credentials for a ready-to-send `Authorization` header value.
    async fn get_token(&self, credentials: &Credentials) -> Result<String>;
}

#[async_trait]
pub trait EmployeeDirectoryPort: Send + Sync {
    async fn list_employees(&self, auth_header: Option<&str>) -> Result<EmployeeList>;
}

// Host content-graph ports
#[async_trait]
pub trait NodeStorePort: Send + Sync {
    async fn create_node(&self, node: ContentNode) -> Result<()>;
    async fn get_node(&self, id: &str) -> Option<ContentNode>;
    /// Keep-alive for a node that was not recreated this build.
    async fn touch_node(&self, id: &str);
    async fn create_parent_child_link(&self, parent_id: &str, child_id: &str) -> Result<()>;
}

pub trait NodeFactory: Send + Sync {
    fn make_node_id(&self, local_key: &str) -> String;
    fn digest(&self, value: &Value) -> String;
}

/// Key/value cache that survives across builds.
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub auth_header: Option<String>,
    pub parent_node_id: String,
}

#[async_trait]
pub trait RemoteFilePort: Send + Sync {
    /// Download `request.url` and materialize it as an artifact node.
    async fn download(&self, request: DownloadRequest) -> Result<ContentNode>;
}

pub trait DiagnosticsPort: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}
