//! In-memory graph store.
//!
//! Reference implementation of `GraphStore`, built on HashMaps behind
//! RwLocks plus an identity index giving merge-by-key semantics.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes apply immediately; rollback does NOT undo mutations. Because
//!   every write here is an idempotent merge, a retried row converges to the
//!   same state anyway.
//! - **Coarse locking**: per-collection locks; multi-step mutations are not
//!   atomic across collections.
//!
//! Use this store for testing the pipeline end-to-end and for embedding
//! without an external graph database.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use async_trait::async_trait;

use crate::model::*;
use crate::tx::{Transaction, TxMode, TxId};
use crate::Result;
use super::GraphStore;

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory property graph with merge-by-identity semantics.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<NodeId, Node>>,
    relationships: RwLock<HashMap<RelId, Relationship>>,
    /// node_id → list of relationship IDs
    adjacency: RwLock<HashMap<NodeId, Vec<RelId>>>,
    /// (label, name) → node ID: the merge key index
    identity: RwLock<HashMap<(String, String), NodeId>>,
    /// (src, dst, rel_type) → rel ID: the edge merge key index
    rel_identity: RwLock<HashMap<(NodeId, NodeId, String), RelId>>,
    /// label → node IDs
    label_index: RwLock<HashMap<String, Vec<NodeId>>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
    next_tx_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                relationships: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                identity: RwLock::new(HashMap::new()),
                rel_identity: RwLock::new(HashMap::new()),
                label_index: RwLock::new(HashMap::new()),
                next_node_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (a marker — no real MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode })
    }

    /// No-op: the memory store applies writes immediately, not on commit.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    /// No-op. Mutations applied during this transaction are NOT reverted;
    /// merges are idempotent, so a retry converges.
    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    // ========================================================================
    // Upserts
    // ========================================================================

    async fn merge_node(
        &self,
        _tx: &mut MemoryTx,
        label: &str,
        name: &str,
        props: PropertyMap,
    ) -> Result<NodeId> {
        let key = (label.to_owned(), name.to_owned());

        // Identity lock held across lookup and insert so two merges of the
        // same key can't race into two nodes.
        let mut identity = self.inner.identity.write();
        if let Some(&id) = identity.get(&key) {
            let mut nodes = self.inner.nodes.write();
            if let Some(node) = nodes.get_mut(&id) {
                node.properties.extend(props);
            }
            return Ok(id);
        }

        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        let mut node = Node::new(id, label, name);
        node.properties = props;

        identity.insert(key, id);
        self.inner.label_index.write().entry(label.to_owned()).or_default().push(id);
        self.inner.nodes.write().insert(id, node);
        self.inner.adjacency.write().insert(id, Vec::new());

        Ok(id)
    }

    async fn merge_relationship(
        &self,
        _tx: &mut MemoryTx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
    ) -> Result<RelId> {
        {
            let nodes = self.inner.nodes.read();
            if !nodes.contains_key(&src) {
                return Err(crate::Error::NotFound(format!("source node {src}")));
            }
            if !nodes.contains_key(&dst) {
                return Err(crate::Error::NotFound(format!("target node {dst}")));
            }
        }

        let key = (src, dst, rel_type.to_owned());
        let mut rel_identity = self.inner.rel_identity.write();
        if let Some(&id) = rel_identity.get(&key) {
            return Ok(id);
        }

        let id = RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        rel_identity.insert(key, id);
        self.inner
            .relationships
            .write()
            .insert(id, Relationship::new(id, src, dst, rel_type));

        let mut adj = self.inner.adjacency.write();
        adj.entry(src).or_default().push(id);
        if src != dst {
            adj.entry(dst).or_default().push(id);
        }

        Ok(id)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    async fn find_node(&self, _tx: &MemoryTx, label: &str, name: &str) -> Result<Option<Node>> {
        let identity = self.inner.identity.read();
        let Some(&id) = identity.get(&(label.to_owned(), name.to_owned())) else {
            return Ok(None);
        };
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn get_node(&self, _tx: &MemoryTx, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn get_relationships(
        &self,
        _tx: &MemoryTx,
        node: NodeId,
        dir: Direction,
        rel_type: Option<&str>,
    ) -> Result<Vec<Relationship>> {
        let adj = self.inner.adjacency.read();
        let rels = self.inner.relationships.read();

        let rel_ids = adj.get(&node).cloned().unwrap_or_default();
        let mut result = Vec::new();

        for rid in rel_ids {
            if let Some(rel) = rels.get(&rid) {
                let matches_dir = match dir {
                    Direction::Outgoing => rel.src == node,
                    Direction::Incoming => rel.dst == node,
                    Direction::Both => true,
                };
                let matches_type = rel_type.is_none_or(|t| rel.rel_type == t);
                if matches_dir && matches_type {
                    result.push(rel.clone());
                }
            }
        }

        Ok(result)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    async fn node_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.nodes.read().len() as u64)
    }

    async fn relationship_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.relationships.read().len() as u64)
    }

    async fn labels(&self, _tx: &MemoryTx) -> Result<Vec<String>> {
        Ok(self.inner.label_index.read().keys().cloned().collect())
    }

    async fn relationship_types(&self, _tx: &MemoryTx) -> Result<Vec<String>> {
        let rels = self.inner.relationships.read();
        let mut types: Vec<String> = rels.values().map(|r| r.rel_type.clone()).collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn all_nodes(&self, _tx: &MemoryTx) -> Result<Vec<Node>> {
        Ok(self.inner.nodes.read().values().cloned().collect())
    }

    async fn nodes_by_label(&self, _tx: &MemoryTx, label: &str) -> Result<Vec<Node>> {
        let idx = self.inner.label_index.read();
        let nodes = self.inner.nodes.read();
        let ids = idx.get(label).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| nodes.get(id).cloned()).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
