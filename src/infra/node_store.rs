use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::app::ports::NodeStorePort;
use crate::domain::ContentNode;
use crate::error::{Result, SourceError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeSnapshot {
    nodes: BTreeMap<String, ContentNode>,
}

#[derive(Debug, Default)]
struct StoreState {
    nodes: BTreeMap<String, ContentNode>,
    /// Nodes created or touched during the current build
    live: HashSet<String>,
}

/// In-memory node store with an optional JSON snapshot between builds.
///
/// Nodes loaded from a snapshot are not live until they are created again or
/// touched; [`InMemoryNodeStore::collect_garbage`] drops the rest.
#[derive(Debug, Default)]
pub struct InMemoryNodeStore {
    state: Mutex<StoreState>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`InMemoryNodeStore::save`]; a missing file
    /// gives an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = fs::read(path)?;
        let snapshot: NodeSnapshot = serde_json::from_slice(&raw)?;
        debug!(nodes = snapshot.nodes.len(), "Loaded node snapshot");
        Ok(Self {
            state: Mutex::new(StoreState {
                nodes: snapshot.nodes,
                live: HashSet::new(),
            }),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let state = self.lock();
        let snapshot = NodeSnapshot {
            nodes: state.nodes.clone(),
        };
        fs::write(path, serde_json::to_vec_pretty(&snapshot)?)?;
        Ok(())
    }

    /// Remove every node that was neither created nor touched this build and
    /// drop dangling parent/child references. Returns how many were removed.
    pub fn collect_garbage(&self) -> usize {
        let mut state = self.lock();
        let StoreState { nodes, live } = &mut *state;
        let before = nodes.len();
        nodes.retain(|id, _| live.contains(id));
        let removed = before - nodes.len();

        let remaining: HashSet<String> = nodes.keys().cloned().collect();
        for node in nodes.values_mut() {
            node.children.retain(|child| remaining.contains(child));
            if node
                .parent
                .as_ref()
                .is_some_and(|p| !remaining.contains(p))
            {
                node.parent = None;
            }
        }

        if removed > 0 {
            info!(removed, "Removed stale nodes");
        }
        removed
    }

    /// Forget a node outright, as the host does when a file becomes unavailable.
    pub fn delete_node(&self, id: &str) -> Option<ContentNode> {
        let mut state = self.lock();
        state.live.remove(id);
        state.nodes.remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children_of(&self, id: &str) -> Vec<String> {
        self.lock()
            .nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn nodes_of_type(&self, node_type: &str) -> Vec<ContentNode> {
        self.lock()
            .nodes
            .values()
            .filter(|n| n.internal.node_type == node_type)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl NodeStorePort for InMemoryNodeStore {
    async fn create_node(&self, node: ContentNode) -> Result<()> {
        if node.id.is_empty() {
            return Err(SourceError::Store("node id must not be empty".to_string()));
        }
        let mut state = self.lock();
        state.live.insert(node.id.clone());
        state.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    async fn get_node(&self, id: &str) -> Option<ContentNode> {
        self.lock().nodes.get(id).cloned()
    }

    async fn touch_node(&self, id: &str) {
        let mut state = self.lock();
        if state.nodes.contains_key(id) {
            state.live.insert(id.to_string());
        }
    }

    async fn create_parent_child_link(&self, parent_id: &str, child_id: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.nodes.contains_key(child_id) {
            return Err(SourceError::Store(format!("unknown child node {}", child_id)));
        }
        let parent = state
            .nodes
            .get_mut(parent_id)
            .ok_or_else(|| SourceError::Store(format!("unknown parent node {}", parent_id)))?;
        if !parent.children.iter().any(|c| c == child_id) {
            parent.children.push(child_id.to_string());
        }
        if let Some(child) = state.nodes.get_mut(child_id) {
            child.parent = Some(parent_id.to_string());
        }
        Ok(())
    }
}
