//! Cypher MERGE export — serialize upsert plans as a Cypher script.
//!
//! Produces the same statements the pipeline would issue against a real
//! Neo4j instance, so a reconciled batch can be loaded into Neo4j Browser
//! or `cypher-shell` without this crate in the loop.
//!
//! ```text
//! reconciled rows → plan_upserts() → MERGE statements → cypher-shell
//! ```

use std::io::Write;

use chrono::Utc;
use serde_json::json;

use crate::model::{Direction, ReconciledRow, Value};
use crate::plan::{plan_upserts, NodeKey, UpsertOp};
use crate::store::GraphStore;
use crate::tx::TxMode;
use crate::Result;

/// Write a Cypher MERGE script for a batch of reconciled rows.
pub fn export_cypher_script<W: Write>(writer: &mut W, rows: &[ReconciledRow]) -> Result<()> {
    writeln!(writer, "// acmv-graph Cypher export")?;
    writeln!(writer, "// Generated: {}", Utc::now().to_rfc3339())?;
    writeln!(writer, "// Reconciled rows: {}", rows.len())?;
    writeln!(writer)?;

    for row in rows {
        writeln!(
            writer,
            "// {} [{}]",
            row.sensor.nomenclature_naming, row.matched_layer
        )?;
        for op in plan_upserts(row) {
            write_op(writer, &op)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_op<W: Write>(writer: &mut W, op: &UpsertOp) -> Result<()> {
    match op {
        UpsertOp::MergeNode { key, props } => {
            if props.is_empty() {
                writeln!(writer, "MERGE (n:{} {{name: {}}});", key.label, quote(&key.name))?;
            } else {
                writeln!(writer, "MERGE (n:{} {{name: {}}})", key.label, quote(&key.name))?;
                let mut parts: Vec<String> = props
                    .iter()
                    .map(|(k, v)| format!("n.{k} = {}", format_value(v)))
                    .collect();
                parts.sort();
                writeln!(writer, "SET {};", parts.join(", "))?;
            }
        }
        UpsertOp::MergeRel { rel_type, src, dst } => {
            writeln!(
                writer,
                "MATCH (a{}), (b{}) MERGE (a)-[:{}]->(b);",
                pattern(src),
                pattern(dst),
                rel_type
            )?;
        }
    }
    Ok(())
}

/// Dump the whole graph as the element list a visualization front end
/// consumes: `{"nodes": [{"data": {...}}], "edges": [{"data": {...}}]}`.
pub async fn export_graph_json<S: GraphStore>(store: &S) -> Result<serde_json::Value> {
    let tx = store.begin_tx(TxMode::ReadOnly).await?;

    let all = store.all_nodes(&tx).await?;
    let mut nodes = Vec::with_capacity(all.len());
    let mut edges = Vec::new();

    for node in &all {
        nodes.push(json!({
            "data": {
                "id": node.id.0,
                "label": node.label,
                "name": node.name,
            }
        }));
        for rel in store
            .get_relationships(&tx, node.id, Direction::Outgoing, None)
            .await?
        {
            edges.push(json!({
                "data": {
                    "id": rel.id.0,
                    "source": rel.src.0,
                    "target": rel.dst.0,
                    "label": rel.rel_type,
                }
            }));
        }
    }

    store.commit_tx(tx).await?;
    Ok(json!({ "nodes": nodes, "edges": edges }))
}

fn pattern(key: &NodeKey) -> String {
    format!(":{} {{name: {}}}", key.label, quote(&key.name))
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Format a Value as a Cypher literal.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{f}"),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HierarchyRow, MatchedLayer, SensorRecord};

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::String("a'b".into())), "'a\\'b'");
        assert_eq!(format_value(&Value::Int(42)), "42");
        assert_eq!(format_value(&Value::Float(3.5)), "3.5");
        assert_eq!(format_value(&Value::Null), "null");
    }

    fn sample_row() -> ReconciledRow {
        ReconciledRow {
            sensor: SensorRecord {
                nomenclature_naming: "PLGS-C1-AHU01-Z01".into(),
                object_name: "AI_101".into(),
                description: Some("Supply air temp".into()),
                upper_limit: Some(50.0),
                lower_limit: None,
                object_type: None,
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
                layer2: None,
                layer3: None,
                serving_area: "Zone-A".into(),
                zone: "Z1".into(),
            },
            matched_layer: MatchedLayer::Layer1,
        }
    }

    #[test]
    fn test_export_contains_merges() {
        let mut buf = Vec::new();
        export_cypher_script(&mut buf, &[sample_row()]).unwrap();
        let script = String::from_utf8(buf).unwrap();

        assert!(script.contains("MERGE (n:Nomenclature {name: 'PLGS-C1-AHU01-Z01'});"));
        assert!(script.contains("MERGE (n:SensorObject {name: 'AI_101'})"));
        assert!(script.contains("n.units = 'degC'"));
        assert!(script.contains("MERGE (a)-[:HAS_SENSOR]->(b);"));
        assert!(script.contains("MERGE (a)-[:IN_ZONE]->(b);"));
    }

    #[tokio::test]
    async fn test_graph_json_shape() {
        let store = crate::store::MemoryStore::new();
        crate::loader::load_rows(&store, &[sample_row()]).await.unwrap();

        let graph = export_graph_json(&store).await.unwrap();
        let nodes = graph["nodes"].as_array().unwrap();
        let edges = graph["edges"].as_array().unwrap();
        assert_eq!(nodes.len(), 6);
        assert_eq!(edges.len(), 4);
        assert!(nodes.iter().any(|n| n["data"]["label"] == "SensorObject"
            && n["data"]["name"] == "AI_101"));
        assert!(edges.iter().any(|e| e["data"]["label"] == "IN_ZONE"));
    }
}
