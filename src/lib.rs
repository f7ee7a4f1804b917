//! # acmv-graph — BACnet ↔ ACMV reconciliation into a property graph
//!
//! Reconciles two independently-authored descriptions of a building's sensor
//! network — a flat BACnet point list and a hierarchical ACMV zone/area/
//! equipment table — into one linked property graph.
//!
//! ## Pipeline
//!
//! 1. **Expand** (`expand`): compound hierarchy cells (`"A & B"`,
//!    `"C1-AHU-01 to 03"`) become one row per atomic combination.
//! 2. **Normalize** (`normalize`): a sensor's free-form nomenclature code
//!    becomes a fixed-arity match key; unparseable codes pass through.
//! 3. **Reconcile** (`reconcile`): each sensor's search string is tested
//!    against the hierarchy's layer columns; matches join into
//!    `ReconciledRow`s with layer provenance, misses are dropped and counted.
//! 4. **Load** (`plan` + `loader`): each reconciled row becomes an
//!    idempotent set of node/relationship upserts applied through a
//!    [`GraphStore`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use acmv_graph::{loader, run_pipeline, table, MemoryStore};
//!
//! # async fn example() -> acmv_graph::Result<()> {
//! let hierarchy = table::read_raw_csv(std::fs::File::open("acmv.csv")?)?;
//! let sensors = table::read_sensors_csv(std::fs::File::open("points.csv")?)?;
//!
//! let rows = run_pipeline(&sensors, &hierarchy)?;
//! table::write_reconciled_csv(std::fs::File::create("reconciled.csv")?, &rows)?;
//!
//! let store = MemoryStore::new();
//! let report = loader::load_rows(&store, &rows).await?;
//! println!("{} nodes, {} relationships", report.node_count, report.relationship_count);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod expand;
pub mod export;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod plan;
pub mod reconcile;
pub mod store;
pub mod table;
pub mod tx;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    Direction, HierarchyRow, MatchedLayer, Node, NodeId, PropertyMap, ReconciledRow,
    RelId, Relationship, SensorRecord, Value,
};
pub use normalize::{normalize, MatchKey};
pub use plan::{plan_upserts, NodeKey, UpsertOp};
pub use reconcile::{reconcile, reconcile_with_stats, ReconcileStats};
pub use store::{GraphStore, MemoryStore};
pub use tx::{Transaction, TxId, TxMode};

use tracing::info;

/// Expand the raw hierarchy table and reconcile the sensor list against it.
///
/// Fails only on input-shape problems (missing hierarchy columns); sensors
/// that do not parse or do not match are handled per-record and never abort
/// the batch.
pub fn run_pipeline(
    sensors: &[SensorRecord],
    raw_hierarchy: &table::RawTable,
) -> Result<Vec<ReconciledRow>> {
    let hierarchy = expand::expand(raw_hierarchy)?;
    let (rows, stats) = reconcile::reconcile_with_stats(sensors, &hierarchy);
    info!(
        hierarchy_rows = hierarchy.len(),
        reconciled = stats.matched_sensors,
        total = stats.total_sensors,
        "pipeline complete"
    );
    Ok(rows)
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("malformed input table: {0}")]
    ShapeError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("transaction error: {0}")]
    TxError(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
