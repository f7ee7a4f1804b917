//! # Data Model
//!
//! Clean DTOs shared by every pipeline stage: the domain records
//! (hierarchy, sensor, reconciled) and the property-graph types the
//! constructor emits. This module is pure data — no I/O, no state, no async.

pub mod node;
pub mod property_map;
pub mod records;
pub mod relationship;
pub mod value;

pub use node::{Node, NodeId};
pub use property_map::{props, PropertyMap};
pub use records::{HierarchyRow, MatchedLayer, ReconciledRow, SensorRecord};
pub use relationship::{Direction, RelId, Relationship};
pub use value::Value;
