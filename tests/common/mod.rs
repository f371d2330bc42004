#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use personio_source::app::diagnostics::CollectingDiagnostics;
use personio_source::app::ports::{
    AuthPort, CachePort, DownloadRequest, EmployeeDirectoryPort, NodeFactory, NodeStorePort,
    RemoteFilePort,
};
use personio_source::config::Credentials;
use personio_source::digest::{sha256_hex, Uuid5NodeFactory};
use personio_source::domain::{ContentNode, EmployeeList, NodeInternal};
use personio_source::error::{Result, SourceError};
use personio_source::infra::cache_store::MemoryCache;
use personio_source::infra::node_store::InMemoryNodeStore;
use personio_source::SourcePorts;

pub fn credentials() -> Credentials {
    Credentials {
        client_id: "client".into(),
        client_secret: "secret".into(),
    }
}

pub fn factory() -> Arc<Uuid5NodeFactory> {
    Arc::new(Uuid5NodeFactory::new("personio-source"))
}

pub struct MockAuth {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockAuth {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthPort for MockAuth {
    async fn get_token(&self, _credentials: &Credentials) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::Api {
                message: "auth unavailable".into(),
            });
        }
        Ok(format!("Bearer token-{}", n))
    }
}

pub struct MockDirectory {
    pub response: Result<Value>,
    pub seen_headers: Mutex<Vec<Option<String>>>,
}

impl MockDirectory {
    pub fn returning(response: Value) -> Self {
        Self {
            response: Ok(response),
            seen_headers: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(SourceError::Api {
                message: "employees unavailable".into(),
            }),
            seen_headers: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen_headers.lock().unwrap().len()
    }
}

#[async_trait]
impl EmployeeDirectoryPort for MockDirectory {
    async fn list_employees(&self, auth_header: Option<&str>) -> Result<EmployeeList> {
        self.seen_headers
            .lock()
            .unwrap()
            .push(auth_header.map(|s| s.to_string()));
        match &self.response {
            Ok(value) => Ok(serde_json::from_value(value.clone())?),
            Err(e) => Err(SourceError::Api {
                message: e.to_string(),
            }),
        }
    }
}

/// Materializes a `File` node in the shared store for every successful
/// download, the way the real adapter does.
pub struct MockRemoteFiles {
    pub store: Arc<InMemoryNodeStore>,
    pub factory: Arc<Uuid5NodeFactory>,
    pub failing_urls: HashSet<String>,
    pub panicking_urls: HashSet<String>,
    pub requests: Mutex<Vec<DownloadRequest>>,
    /// Bumped into the artifact id so repeated downloads are distinguishable
    pub generation: AtomicUsize,
}

impl MockRemoteFiles {
    pub fn new(store: Arc<InMemoryNodeStore>) -> Self {
        Self {
            store,
            factory: factory(),
            failing_urls: HashSet::new(),
            panicking_urls: HashSet::new(),
            requests: Mutex::new(Vec::new()),
            generation: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    /// Downloads of `url` panic inside the task instead of returning an error.
    pub fn panicking_on(mut self, url: &str) -> Self {
        self.panicking_urls.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteFilePort for MockRemoteFiles {
    async fn download(&self, request: DownloadRequest) -> Result<ContentNode> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        if self.panicking_urls.contains(&request.url) {
            panic!("decoder blew up on {}", request.url);
        }
        if self.failing_urls.contains(&request.url) {
            return Err(SourceError::Api {
                message: format!("connection reset fetching {}", request.url),
            });
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        let node = ContentNode {
            id: self
                .factory
                .make_node_id(&format!("remote-file-{}#{}", request.url, generation)),
            parent: Some(request.parent_node_id.clone()),
            children: Vec::new(),
            internal: NodeInternal {
                node_type: "File".into(),
                content_digest: sha256_hex(request.url.as_bytes()),
            },
            content: json!({ "url": request.url }),
        };
        self.store.create_node(node.clone()).await?;
        Ok(node)
    }
}

/// A cache whose reads always fail.
pub struct BrokenCache;

#[async_trait]
impl CachePort for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(SourceError::Store("cache offline".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(SourceError::Store("cache offline".into()))
    }
}

pub struct Harness {
    pub auth: Arc<MockAuth>,
    pub directory: Arc<MockDirectory>,
    pub store: Arc<InMemoryNodeStore>,
    pub cache: Arc<MemoryCache>,
    pub files: Arc<MockRemoteFiles>,
    pub diagnostics: Arc<CollectingDiagnostics>,
}

impl Harness {
    pub fn new(directory: MockDirectory) -> Self {
        let store = Arc::new(InMemoryNodeStore::new());
        Self {
            auth: Arc::new(MockAuth::ok()),
            directory: Arc::new(directory),
            files: Arc::new(MockRemoteFiles::new(store.clone())),
            store,
            cache: Arc::new(MemoryCache::new()),
            diagnostics: Arc::new(CollectingDiagnostics::new()),
        }
    }

    pub fn ports(&self) -> SourcePorts {
        SourcePorts {
            auth: self.auth.clone(),
            directory: self.directory.clone(),
            store: self.store.clone(),
            factory: factory(),
            cache: self.cache.clone(),
            files: self.files.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

pub fn employee(id: Value, first_name: &str, picture: Option<&str>) -> Value {
    json!({
        "type": "Employee",
        "attributes": {
            "id": {"label": "ID", "value": id},
            "first_name": {"label": "First name", "value": first_name},
            "profile_picture": {"label": "Profile Picture", "value": picture},
        }
    })
}
