//! Hierarchy Matcher & Reconciler.
//!
//! For each sensor: normalize the nomenclature code, then test the effective
//! search string for containment against each layer column over all hierarchy
//! rows at once (one mask per column, computed in fixed order layer1, layer2,
//! layer3). The provenance is the last column in that order with any hit, and
//! the sensor joins every hierarchy row where that column matched. Sensors
//! with no hit anywhere are dropped, counted, and logged — never an error.

use tracing::{debug, info};

use crate::model::{HierarchyRow, MatchedLayer, ReconciledRow, SensorRecord};
use crate::normalize::normalize;

/// Points whose equipment location carries this token have no hierarchy
/// relation by convention and are skipped outright.
const SKIP_PREFIX: &str = "TS-";

/// Counters for the reconciled-vs-total metric the caller logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub total_sensors: usize,
    pub skipped_sensors: usize,
    pub matched_sensors: usize,
    pub unmatched_sensors: usize,
    pub reconciled_rows: usize,
}

/// Join sensors onto the expanded hierarchy. See the module docs for the
/// tie-break and fan-out rules.
pub fn reconcile(sensors: &[SensorRecord], hierarchy: &[HierarchyRow]) -> Vec<ReconciledRow> {
    reconcile_with_stats(sensors, hierarchy).0
}

pub fn reconcile_with_stats(
    sensors: &[SensorRecord],
    hierarchy: &[HierarchyRow],
) -> (Vec<ReconciledRow>, ReconcileStats) {
    let mut stats = ReconcileStats { total_sensors: sensors.len(), ..Default::default() };
    let mut out = Vec::new();

    for sensor in sensors {
        if should_skip(sensor) {
            debug!(code = %sensor.nomenclature_naming, "skipping TS- point");
            stats.skipped_sensors += 1;
            continue;
        }

        let query = normalize(&sensor.nomenclature_naming).search_string();

        // One containment mask per layer column, all rows at once. The last
        // column with any hit wins, and selection uses that column's mask.
        let mut matched: Option<(MatchedLayer, Vec<bool>)> = None;
        for layer in [MatchedLayer::Layer1, MatchedLayer::Layer2, MatchedLayer::Layer3] {
            let mask: Vec<bool> = hierarchy
                .iter()
                .map(|row| layer_value(row, layer).is_some_and(|v| v.contains(&query)))
                .collect();
            if mask.iter().any(|&hit| hit) {
                matched = Some((layer, mask));
            }
        }

        let Some((layer, mask)) = matched else {
            debug!(code = %sensor.nomenclature_naming, query, "no hierarchy match");
            stats.unmatched_sensors += 1;
            continue;
        };

        stats.matched_sensors += 1;
        for (row, &selected) in hierarchy.iter().zip(mask.iter()) {
            if selected {
                out.push(ReconciledRow {
                    sensor: sensor.clone(),
                    hierarchy: row.clone(),
                    matched_layer: layer,
                });
            }
        }
    }

    stats.reconciled_rows = out.len();
    info!(
        total = stats.total_sensors,
        matched = stats.matched_sensors,
        unmatched = stats.unmatched_sensors,
        skipped = stats.skipped_sensors,
        rows = stats.reconciled_rows,
        "reconciliation complete"
    );
    (out, stats)
}

fn should_skip(sensor: &SensorRecord) -> bool {
    sensor
        .equipment_location
        .as_deref()
        .is_some_and(|loc| loc.trim_start().starts_with(SKIP_PREFIX))
}

fn layer_value(row: &HierarchyRow, layer: MatchedLayer) -> Option<&str> {
    match layer {
        MatchedLayer::Layer1 => {
            if row.layer1.is_empty() { None } else { Some(row.layer1.as_str()) }
        }
        MatchedLayer::Layer2 => row.layer2.as_deref(),
        MatchedLayer::Layer3 => row.layer3.as_deref(),
    }
}
