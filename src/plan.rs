//! Graph Constructor — reconciled rows to idempotent upsert plans.
//!
//! A plan is pure data: a sequence of `MergeNode` / `MergeRel` operations
//! keyed by `(label, name)`. Applying the same plan twice must leave the
//! graph unchanged, so a store only needs merge-or-create semantics, not
//! plain inserts. The store side lives in [`crate::loader`].

use serde::{Deserialize, Serialize};

use crate::model::{props, MatchedLayer, PropertyMap, ReconciledRow, Value};

pub mod labels {
    pub const NOMENCLATURE: &str = "Nomenclature";
    pub const SENSOR_OBJECT: &str = "SensorObject";
    pub const SERVING_AREA: &str = "ServingArea";
    pub const LOCATION: &str = "Location";
    pub const ZONE: &str = "Zone";
}

pub mod rel_types {
    pub const HAS_SENSOR: &str = "HAS_SENSOR";
    pub const FEEDS: &str = "FEEDS";
    pub const SERVES: &str = "SERVES";
    pub const INSIDE: &str = "INSIDE";
    pub const IN_ZONE: &str = "IN_ZONE";
}

/// Identity key of a node: its label plus the `name` merge property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub label: String,
    pub name: String,
}

impl NodeKey {
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self { label: label.into(), name: name.into() }
    }
}

/// One idempotent write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpsertOp {
    /// Create-if-absent by `(label, name)`, then set `props`.
    MergeNode { key: NodeKey, props: PropertyMap },
    /// Create-if-absent by `(src, dst, rel_type)`. Endpoints are merged
    /// (with no properties) if they do not exist yet.
    MergeRel { rel_type: String, src: NodeKey, dst: NodeKey },
}

fn merge_node(label: &str, name: &str) -> UpsertOp {
    UpsertOp::MergeNode { key: NodeKey::new(label, name), props: PropertyMap::new() }
}

fn merge_rel(rel_type: &str, src: NodeKey, dst: NodeKey) -> UpsertOp {
    UpsertOp::MergeRel { rel_type: rel_type.to_owned(), src, dst }
}

/// Build the upsert plan for one reconciled row.
///
/// The SERVES/INSIDE/IN_ZONE containment chain always hangs off the sensor's
/// own nomenclature code. The FEEDS supply chain is built only when the match
/// came from the first layer, and connects the layer codes to each other.
pub fn plan_upserts(row: &ReconciledRow) -> Vec<UpsertOp> {
    let sensor = &row.sensor;
    let h = &row.hierarchy;

    let nomenclature = NodeKey::new(labels::NOMENCLATURE, &sensor.nomenclature_naming);
    let sensor_object = NodeKey::new(labels::SENSOR_OBJECT, &sensor.object_name);
    let serving_area = NodeKey::new(labels::SERVING_AREA, &h.serving_area);
    let location = NodeKey::new(labels::LOCATION, &h.location);
    let zone = NodeKey::new(labels::ZONE, &h.zone);

    let mut ops = vec![
        UpsertOp::MergeNode { key: nomenclature.clone(), props: PropertyMap::new() },
        UpsertOp::MergeNode {
            key: sensor_object.clone(),
            props: props([
                ("description", Value::from(sensor.description.clone())),
                ("upper_limit", Value::from(sensor.upper_limit)),
                ("lower_limit", Value::from(sensor.lower_limit)),
                ("value_type", Value::from(sensor.object_type.clone())),
                ("units", Value::from(sensor.units.clone())),
            ]),
        },
        merge_rel(rel_types::HAS_SENSOR, nomenclature.clone(), sensor_object),
    ];

    if row.matched_layer == MatchedLayer::Layer1 {
        ops.extend(feeds_chain(h));
    }

    // Containment chain from the sensor's own code, regardless of which
    // layer matched.
    ops.push(UpsertOp::MergeNode { key: serving_area.clone(), props: PropertyMap::new() });
    ops.push(UpsertOp::MergeNode { key: location.clone(), props: PropertyMap::new() });
    ops.push(UpsertOp::MergeNode { key: zone.clone(), props: PropertyMap::new() });
    ops.push(merge_rel(rel_types::SERVES, nomenclature, serving_area.clone()));
    ops.push(merge_rel(rel_types::INSIDE, serving_area, location.clone()));
    ops.push(merge_rel(rel_types::IN_ZONE, location, zone));

    ops
}

/// FEEDS topology among the layer codes for a first-layer match.
fn feeds_chain(h: &crate::model::HierarchyRow) -> Vec<UpsertOp> {
    let layer1 = NodeKey::new(labels::NOMENCLATURE, &h.layer1);
    let serving_area = NodeKey::new(labels::SERVING_AREA, &h.serving_area);
    let layer2 = h.layer2.as_deref().filter(|s| !s.is_empty());
    let layer3 = h.layer3.as_deref().filter(|s| !s.is_empty());

    let mut ops = Vec::new();
    match (layer2, layer3) {
        (Some(l2), Some(l3)) => {
            let l2 = NodeKey::new(labels::NOMENCLATURE, l2);
            let l3 = NodeKey::new(labels::NOMENCLATURE, l3);
            ops.push(merge_node(labels::NOMENCLATURE, &h.layer1));
            ops.push(merge_rel(rel_types::FEEDS, layer1, l2.clone()));
            ops.push(merge_rel(rel_types::FEEDS, l2, l3.clone()));
            ops.push(merge_rel(rel_types::SERVES, l3, serving_area));
        }
        (Some(l2), None) => {
            let l2 = NodeKey::new(labels::NOMENCLATURE, l2);
            ops.push(merge_node(labels::NOMENCLATURE, &h.layer1));
            ops.push(merge_rel(rel_types::FEEDS, layer1, l2.clone()));
            ops.push(merge_rel(rel_types::SERVES, l2, serving_area));
        }
        (None, Some(l3)) => {
            let l3 = NodeKey::new(labels::NOMENCLATURE, l3);
            ops.push(merge_node(labels::NOMENCLATURE, &h.layer1));
            ops.push(merge_rel(rel_types::FEEDS, layer1, l3.clone()));
            ops.push(merge_rel(rel_types::SERVES, l3, serving_area));
        }
        (None, None) => {
            // Lone first layer: merge the node with no edges. It stays
            // disconnected from the sensor's containment chain.
            ops.push(merge_node(labels::NOMENCLATURE, &h.layer1));
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HierarchyRow, SensorRecord};

    fn row(
        layer2: Option<&str>,
        layer3: Option<&str>,
        matched_layer: MatchedLayer,
    ) -> ReconciledRow {
        ReconciledRow {
            sensor: SensorRecord {
                nomenclature_naming: "PLGS-C1-AHU01-Z01".into(),
                object_name: "AI_101".into(),
                description: Some("Supply air temp".into()),
                upper_limit: Some(50.0),
                lower_limit: Some(0.0),
                object_type: Some("analogInput".into()),
                units: Some("degC".into()),
                device_id: None,
                device_ip: None,
                device_port: None,
                device_mac: None,
                polling_mode: None,
                equipment_location: None,
            },
            hierarchy: HierarchyRow {
                location: "L2".into(),
                layer1: "C1-AHU-01-01".into(),
                layer2: layer2.map(str::to_owned),
                layer3: layer3.map(str::to_owned),
                serving_area: "Zone-A".into(),
                zone: "Z1".into(),
            },
            matched_layer,
        }
    }

    fn rels<'a>(ops: &'a [UpsertOp], rel_type: &str) -> Vec<(&'a str, &'a str)> {
        ops.iter()
            .filter_map(|op| match op {
                UpsertOp::MergeRel { rel_type: t, src, dst } if t == rel_type => {
                    Some((src.name.as_str(), dst.name.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_unconditional_chain_always_present() {
        for layer in [MatchedLayer::Layer1, MatchedLayer::Layer2, MatchedLayer::Layer3] {
            let ops = plan_upserts(&row(None, None, layer));
            assert_eq!(
                rels(&ops, rel_types::HAS_SENSOR),
                [("PLGS-C1-AHU01-Z01", "AI_101")]
            );
            assert_eq!(rels(&ops, rel_types::SERVES), [("PLGS-C1-AHU01-Z01", "Zone-A")]);
            assert_eq!(rels(&ops, rel_types::INSIDE), [("Zone-A", "L2")]);
            assert_eq!(rels(&ops, rel_types::IN_ZONE), [("L2", "Z1")]);
        }
    }

    #[test]
    fn test_sensor_props_on_merge() {
        let ops = plan_upserts(&row(None, None, MatchedLayer::Layer1));
        let sensor_props = ops
            .iter()
            .find_map(|op| match op {
                UpsertOp::MergeNode { key, props } if key.label == labels::SENSOR_OBJECT => {
                    Some(props)
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(sensor_props.get("units"), Some(&Value::from("degC")));
        assert_eq!(sensor_props.get("upper_limit"), Some(&Value::Float(50.0)));
        assert_eq!(sensor_props.get("value_type"), Some(&Value::from("analogInput")));
    }

    #[test]
    fn test_full_feeds_chain_with_both_layers() {
        let ops = plan_upserts(&row(Some("RISER-1"), Some("VAV-3"), MatchedLayer::Layer1));
        assert_eq!(
            rels(&ops, rel_types::FEEDS),
            [("C1-AHU-01-01", "RISER-1"), ("RISER-1", "VAV-3")]
        );
        // layer3 serves the area, plus the sensor's own unconditional edge
        assert_eq!(
            rels(&ops, rel_types::SERVES),
            [("VAV-3", "Zone-A"), ("PLGS-C1-AHU01-Z01", "Zone-A")]
        );
    }

    #[test]
    fn test_layer2_serves_when_layer3_absent() {
        let ops = plan_upserts(&row(Some("RISER-1"), None, MatchedLayer::Layer1));
        assert_eq!(rels(&ops, rel_types::FEEDS), [("C1-AHU-01-01", "RISER-1")]);
        assert!(rels(&ops, rel_types::SERVES).contains(&("RISER-1", "Zone-A")));
    }

    #[test]
    fn test_layer1_feeds_layer3_when_layer2_absent() {
        let ops = plan_upserts(&row(None, Some("VAV-3"), MatchedLayer::Layer1));
        assert_eq!(rels(&ops, rel_types::FEEDS), [("C1-AHU-01-01", "VAV-3")]);
        assert!(rels(&ops, rel_types::SERVES).contains(&("VAV-3", "Zone-A")));
    }

    #[test]
    fn test_lone_layer1_merges_disconnected_node() {
        let ops = plan_upserts(&row(None, None, MatchedLayer::Layer1));
        assert!(rels(&ops, rel_types::FEEDS).is_empty());
        assert!(ops.iter().any(|op| matches!(
            op,
            UpsertOp::MergeNode { key, .. }
                if key.label == labels::NOMENCLATURE && key.name == "C1-AHU-01-01"
        )));
    }

    #[test]
    fn test_no_feeds_chain_for_deeper_matches() {
        for layer in [MatchedLayer::Layer2, MatchedLayer::Layer3] {
            let ops = plan_upserts(&row(Some("RISER-1"), Some("VAV-3"), layer));
            assert!(rels(&ops, rel_types::FEEDS).is_empty());
        }
    }
}
