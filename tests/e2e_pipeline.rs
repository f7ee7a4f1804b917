//! End-to-end tests for the full reconciliation pipeline.
//!
//! Each test exercises: CSV in -> expand -> reconcile -> plan -> load
//! against MemoryStore, the way a caller would drive the crate.

use acmv_graph::store::GraphStore;
use acmv_graph::{loader, run_pipeline, table, MatchedLayer, MemoryStore, TxMode};

const HIERARCHY_CSV: &str = "\
Location,1st Layer,2nd Layer,3rd Layer,Serving Area,Zone
L2,C1-AHU-01-01 to 03,,,Zone-A,Z1
L3,C1-FCU-07-01 & C1-FCU-07-02,RISER-1,,Lobby & Atrium,Z2
";

const SENSORS_CSV: &str = "\
nomenclature_naming,object_name,object_description,upper_limit,lower_limit,object_type,units,equipment_location
PLGS-C1-AHU01-Z01,AI_101,Supply air temp,50,0,analogInput,degC,
PLGS-C1-FCU07-Z02,AI_201,Return air temp,45,5,analogInput,degC,
PLGS-C1-PAU99-Z01,AI_301,Orphan point,,,analogInput,degC,
PLGS-C1-AHU02-Z01,AI_401,Skipped point,,,analogInput,degC,TS-L2-01
";

// ============================================================================
// 1. Expansion of a range-encoded hierarchy row
// ============================================================================

#[test]
fn test_range_row_expands_to_atomic_rows() {
    let csv = "\
Location,1st Layer,2nd Layer,3rd Layer,Serving Area,Zone
L2,C1-AHU-01 to 02,,,Zone-A,Z1
";
    let raw = table::read_raw_csv(csv.as_bytes()).unwrap();
    let rows = acmv_graph::expand::expand(&raw).unwrap();

    assert_eq!(rows.len(), 2);
    let names: Vec<&str> = rows.iter().map(|r| r.layer1.as_str()).collect();
    assert_eq!(names, ["C1-AHU-01", "C1-AHU-02"]);
    assert!(rows.iter().all(|r| r.location == "L2"
        && r.serving_area == "Zone-A"
        && r.zone == "Z1"
        && r.layer2.is_none()
        && r.layer3.is_none()));
}

// ============================================================================
// 2. Token alignment: short layer names do not match a 4-token search string
// ============================================================================

#[test]
fn test_search_string_needs_full_token_alignment() {
    // "PLGS-C1-AHU01-Z01" searches for "C1-AHU-01-01"; a layer cell holding
    // only "C1-AHU-01" is shorter than the search string and cannot contain
    // it, so the sensor is unreconciled against this hierarchy.
    let csv = "\
Location,1st Layer,2nd Layer,3rd Layer,Serving Area,Zone
L2,C1-AHU-01 to 02,,,Zone-A,Z1
";
    let raw = table::read_raw_csv(csv.as_bytes()).unwrap();
    let sensors = table::read_sensors_csv(
        "nomenclature_naming,object_name\nPLGS-C1-AHU01-Z01,AI_101\n".as_bytes(),
    )
    .unwrap();

    let rows = run_pipeline(&sensors, &raw).unwrap();
    assert!(rows.is_empty());
}

// ============================================================================
// 3. Full pipeline: CSV -> reconcile -> checkpoint -> load
// ============================================================================

#[tokio::test]
async fn test_full_pipeline_into_store() {
    let raw = table::read_raw_csv(HIERARCHY_CSV.as_bytes()).unwrap();
    let sensors = table::read_sensors_csv(SENSORS_CSV.as_bytes()).unwrap();
    assert_eq!(sensors.len(), 4);

    let rows = run_pipeline(&sensors, &raw).unwrap();

    // AI_101 matches C1-AHU-01-01 once. AI_201's search string
    // "C1-FCU-07-02" matches one layer1 value, which the serving-area
    // conjunction emitted twice (Lobby, Atrium) = 2 rows. AI_301 is
    // unmatched and AI_401 is TS-skipped.
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.matched_layer == MatchedLayer::Layer1));
    assert!(!rows.iter().any(|r| r.sensor.object_name == "AI_301"));
    assert!(!rows.iter().any(|r| r.sensor.object_name == "AI_401"));

    let ai_201_areas: Vec<&str> = rows
        .iter()
        .filter(|r| r.sensor.object_name == "AI_201")
        .map(|r| r.hierarchy.serving_area.as_str())
        .collect();
    assert_eq!(ai_201_areas, ["Lobby", "Atrium"]);

    // Checkpoint round trip preserves the batch exactly.
    let mut buf = Vec::new();
    table::write_reconciled_csv(&mut buf, &rows).unwrap();
    let restored = table::read_reconciled_csv(buf.as_slice()).unwrap();
    assert_eq!(restored, rows);

    // Load into the memory store.
    let store = MemoryStore::new();
    let report = loader::load_rows(&store, &rows).await.unwrap();
    assert_eq!(report.rows_applied, 3);
    assert_eq!(report.rows_failed, 0);

    let tx = store.begin_tx(TxMode::ReadOnly).await.unwrap();

    // Every graph entity label is present.
    let mut labels = store.labels(&tx).await.unwrap();
    labels.sort();
    assert_eq!(
        labels,
        ["Location", "Nomenclature", "SensorObject", "ServingArea", "Zone"]
    );

    // AI_201's fan-out still merges into one SensorObject.
    let sensor_objects = store.nodes_by_label(&tx, "SensorObject").await.unwrap();
    assert_eq!(sensor_objects.len(), 2);

    // The FCU row carried a 2nd Layer, so a FEEDS edge exists.
    let feeds = store.relationships_by_type(&tx, "FEEDS").await.unwrap();
    assert_eq!(feeds.len(), 1);
    let riser = store.find_node(&tx, "Nomenclature", "RISER-1").await.unwrap();
    assert!(riser.is_some());
}

// ============================================================================
// 4. Input-shape errors reject the whole batch
// ============================================================================

#[test]
fn test_missing_hierarchy_column_fails_fast() {
    let csv = "Location,1st Layer,Serving Area,Zone\nL2,AHU-01,Zone-A,Z1\n";
    let raw = table::read_raw_csv(csv.as_bytes()).unwrap();
    let err = run_pipeline(&[], &raw).unwrap_err();
    assert!(matches!(err, acmv_graph::Error::MissingColumn(ref c) if c == "2nd Layer"));
}
