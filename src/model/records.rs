//! Domain records flowing through the reconciliation pipeline.
//!
//! `HierarchyRow` comes out of the expander, `SensorRecord` arrives from the
//! extraction stage, and `ReconciledRow` joins one of each with the match
//! provenance. All three are plain serde-able data; nothing here does I/O.

use serde::{Deserialize, Serialize};

/// One atomic physical/organizational hierarchy entry (ACMV side).
///
/// Produced by the expander and immutable afterwards. `layer1` and
/// `serving_area` are never both empty on an expanded row; `location` is
/// always present (forward-filled from the source table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRow {
    pub location: String,
    pub layer1: String,
    pub layer2: Option<String>,
    pub layer3: Option<String>,
    pub serving_area: String,
    pub zone: String,
}

/// One BACnet point from the extraction/transformation stage.
///
/// Field names follow the transformed point-list table; everything except
/// the nomenclature code and the object name is allowed to be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub nomenclature_naming: String,
    pub object_name: String,
    #[serde(rename = "object_description", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub upper_limit: Option<f64>,
    #[serde(default)]
    pub lower_limit: Option<f64>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub units: Option<String>,

    // Pass-through device metadata, untouched by the pipeline.
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_ip: Option<String>,
    #[serde(default)]
    pub device_port: Option<String>,
    #[serde(default)]
    pub device_mac: Option<String>,
    #[serde(default)]
    pub polling_mode: Option<String>,
    #[serde(default)]
    pub equipment_location: Option<String>,
}

/// Which layer column of the hierarchy produced the match.
///
/// Serialized with the source table's column names so the checkpoint CSV
/// reads the same as the hierarchy table it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchedLayer {
    #[serde(rename = "1st Layer")]
    Layer1,
    #[serde(rename = "2nd Layer")]
    Layer2,
    #[serde(rename = "3rd Layer")]
    Layer3,
}

impl MatchedLayer {
    pub fn column_name(&self) -> &'static str {
        match self {
            MatchedLayer::Layer1 => "1st Layer",
            MatchedLayer::Layer2 => "2nd Layer",
            MatchedLayer::Layer3 => "3rd Layer",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        match name {
            "1st Layer" => Some(MatchedLayer::Layer1),
            "2nd Layer" => Some(MatchedLayer::Layer2),
            "3rd Layer" => Some(MatchedLayer::Layer3),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchedLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// One matched (sensor, hierarchy-row) pair.
///
/// A sensor whose search string is a substring of several hierarchy rows
/// produces several of these; that fan-out is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub sensor: SensorRecord,
    pub hierarchy: HierarchyRow,
    pub matched_layer: MatchedLayer,
}
