//! Loader — applies upsert plans to a graph store.
//!
//! Each reconciled row's plan runs in its own transaction. A row's writes
//! are self-contained and idempotent, so a failed row is retried blind once;
//! a second failure is counted and the batch continues (only structural
//! problems abort a load, never a single row).

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use tracing::{info, warn};

use crate::model::{NodeId, PropertyMap, ReconciledRow};
use crate::plan::{plan_upserts, NodeKey, UpsertOp};
use crate::store::GraphStore;
use crate::tx::TxMode;
use crate::Result;

/// Outcome of one batch load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub rows_applied: usize,
    pub rows_failed: usize,
    pub node_count: u64,
    pub relationship_count: u64,
    pub run_at: DateTime<Utc>,
}

/// Apply one plan inside an already-open transaction.
///
/// `MergeRel` endpoints that were not merged earlier in the plan are merged
/// on demand with no properties, the same way a Cypher `MERGE` of a
/// relationship pattern merges its endpoint nodes.
pub async fn apply_ops<S: GraphStore>(
    store: &S,
    tx: &mut S::Tx,
    ops: &[UpsertOp],
) -> Result<()> {
    let mut resolved: HashMap<NodeKey, NodeId> = HashMap::new();

    for op in ops {
        match op {
            UpsertOp::MergeNode { key, props } => {
                let id = store.merge_node(tx, &key.label, &key.name, props.clone()).await?;
                resolved.insert(key.clone(), id);
            }
            UpsertOp::MergeRel { rel_type, src, dst } => {
                let src_id = resolve(store, tx, &mut resolved, src).await?;
                let dst_id = resolve(store, tx, &mut resolved, dst).await?;
                store.merge_relationship(tx, src_id, dst_id, rel_type).await?;
            }
        }
    }
    Ok(())
}

async fn resolve<S: GraphStore>(
    store: &S,
    tx: &mut S::Tx,
    resolved: &mut HashMap<NodeKey, NodeId>,
    key: &NodeKey,
) -> Result<NodeId> {
    if let Some(&id) = resolved.get(key) {
        return Ok(id);
    }
    let id = store.merge_node(tx, &key.label, &key.name, PropertyMap::new()).await?;
    resolved.insert(key.clone(), id);
    Ok(id)
}

/// Apply one reconciled row in its own transaction.
pub async fn apply_row<S: GraphStore>(store: &S, row: &ReconciledRow) -> Result<()> {
    let ops = plan_upserts(row);
    let mut tx = store.begin_tx(TxMode::ReadWrite).await?;
    match apply_ops(store, &mut tx, &ops).await {
        Ok(()) => store.commit_tx(tx).await,
        Err(e) => {
            store.rollback_tx(tx).await?;
            Err(e)
        }
    }
}

/// Load a batch of reconciled rows, one transaction per row, with a single
/// blind retry per failed row.
pub async fn load_rows<S: GraphStore>(store: &S, rows: &[ReconciledRow]) -> Result<LoadReport> {
    let mut rows_applied = 0usize;
    let mut rows_failed = 0usize;

    for (i, row) in rows.iter().enumerate() {
        match apply_row(store, row).await {
            Ok(()) => rows_applied += 1,
            Err(first) => {
                warn!(row = i, error = %first, "row upsert failed, retrying");
                match apply_row(store, row).await {
                    Ok(()) => rows_applied += 1,
                    Err(second) => {
                        warn!(row = i, error = %second, "row upsert failed after retry");
                        rows_failed += 1;
                    }
                }
            }
        }
    }

    let tx = store.begin_tx(TxMode::ReadOnly).await?;
    let node_count = store.node_count(&tx).await?;
    let relationship_count = store.relationship_count(&tx).await?;
    store.commit_tx(tx).await?;

    let report = LoadReport {
        rows_applied,
        rows_failed,
        node_count,
        relationship_count,
        run_at: Utc::now(),
    };
    info!(
        applied = report.rows_applied,
        failed = report.rows_failed,
        nodes = report.node_count,
        relationships = report.relationship_count,
        "load complete"
    );
    Ok(report)
}
