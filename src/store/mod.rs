//! # Graph Store Trait
//!
//! The contract between the graph constructor and any property-graph store.
//! The store must support merge-or-create-then-set-properties semantics:
//! `merge_node` is keyed by `(label, name)` and `merge_relationship` by
//! `(src, dst, rel_type)`. A real Neo4j deployment satisfies this with
//! `MERGE`; the bundled [`MemoryStore`] is the reference implementation.

pub mod memory;

use async_trait::async_trait;

use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryStore;

/// The upsert-capable transactional storage contract.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    /// The transaction type for this store.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a new transaction.
    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    /// Commit a transaction.
    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Upserts
    // ========================================================================

    /// Create-if-absent by `(label, name)`, then set the given properties on
    /// the node (existing properties not named in `props` are kept).
    async fn merge_node(
        &self,
        tx: &mut Self::Tx,
        label: &str,
        name: &str,
        props: PropertyMap,
    ) -> Result<NodeId>;

    /// Create-if-absent by `(src, dst, rel_type)`.
    async fn merge_relationship(
        &self,
        tx: &mut Self::Tx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
    ) -> Result<RelId>;

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Find a node by its identity key. Returns None if not found.
    async fn find_node(&self, tx: &Self::Tx, label: &str, name: &str) -> Result<Option<Node>>;

    /// Get a node by ID. Returns None if not found.
    async fn get_node(&self, tx: &Self::Tx, id: NodeId) -> Result<Option<Node>>;

    /// Get all relationships of a node, optionally filtered by direction
    /// and type.
    async fn get_relationships(
        &self,
        tx: &Self::Tx,
        node: NodeId,
        dir: Direction,
        rel_type: Option<&str>,
    ) -> Result<Vec<Relationship>>;

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Total number of nodes.
    async fn node_count(&self, tx: &Self::Tx) -> Result<u64>;

    /// Total number of relationships.
    async fn relationship_count(&self, tx: &Self::Tx) -> Result<u64>;

    /// All distinct labels in the graph.
    async fn labels(&self, tx: &Self::Tx) -> Result<Vec<String>>;

    /// All distinct relationship types in the graph.
    async fn relationship_types(&self, tx: &Self::Tx) -> Result<Vec<String>>;

    /// Return all nodes.
    async fn all_nodes(&self, tx: &Self::Tx) -> Result<Vec<Node>>;

    /// Find all nodes with a given label.
    async fn nodes_by_label(&self, tx: &Self::Tx, label: &str) -> Result<Vec<Node>>;

    /// Find all relationships of a given type.
    ///
    /// Default: scans all nodes and collects outgoing relationships of that
    /// type.
    async fn relationships_by_type(
        &self,
        tx: &Self::Tx,
        rel_type: &str,
    ) -> Result<Vec<Relationship>> {
        let mut result = Vec::new();
        for node in self.all_nodes(tx).await? {
            let rels = self
                .get_relationships(tx, node.id, Direction::Outgoing, Some(rel_type))
                .await?;
            result.extend(rels);
        }
        Ok(result)
    }
}
