//! Tabular input/output surfaces.
//!
//! The pipeline consumes two CSV-shaped tables — the raw ACMV hierarchy and
//! the transformed BACnet point list — and persists one: the reconciled
//! checkpoint (one row per matched pair plus the provenance column). Missing
//! required columns reject the whole batch up front; individual malformed
//! cells never abort.

use std::io::{Read, Write};

use crate::model::{MatchedLayer, ReconciledRow, SensorRecord};
use crate::{Error, Result};

/// Required columns of the raw hierarchy table, in source order.
pub const HIERARCHY_COLUMNS: [&str; 6] = [
    "Location",
    "1st Layer",
    "2nd Layer",
    "3rd Layer",
    "Serving Area",
    "Zone",
];

/// Provenance column of the reconciled checkpoint.
pub const FOUND_IN_COLUMN: &str = "found_in_col";

/// A loosely-typed table: named columns over string cells.
///
/// This is the shape the hierarchy source hands us before expansion. Cells
/// are kept verbatim; trimming happens in the expander.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Index of a named column, or a shape error.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    }

    /// Fail fast unless every required column is present.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        for name in required {
            self.column_index(name)?;
        }
        Ok(())
    }

    /// Cell accessor; short rows read as empty cells.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Read a headered CSV into a `RawTable`.
pub fn read_raw_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(RawTable::new(columns, rows))
}

/// Read the transformed BACnet point list.
///
/// Requires at least the nomenclature and object-name columns; everything
/// else deserializes as optional.
pub fn read_sensors_csv<R: Read>(reader: R) -> Result<Vec<SensorRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    {
        let headers = rdr.headers()?;
        for required in ["nomenclature_naming", "object_name"] {
            if !headers.iter().any(|h| h == required) {
                return Err(Error::MissingColumn(required.to_owned()));
            }
        }
    }
    let mut sensors = Vec::new();
    for record in rdr.deserialize() {
        sensors.push(record?);
    }
    Ok(sensors)
}

const RECONCILED_HEADERS: [&str; 20] = [
    "nomenclature_naming",
    "object_name",
    "object_description",
    "upper_limit",
    "lower_limit",
    "object_type",
    "units",
    "device_id",
    "device_ip",
    "device_port",
    "device_mac",
    "polling_mode",
    "equipment_location",
    "Location",
    "1st Layer",
    "2nd Layer",
    "3rd Layer",
    "Serving Area",
    "Zone",
    FOUND_IN_COLUMN,
];

fn opt(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

fn opt_f64(field: &Option<f64>) -> String {
    field.map(|v| v.to_string()).unwrap_or_default()
}

/// Persist reconciled rows as the checkpoint CSV.
pub fn write_reconciled_csv<W: Write>(writer: W, rows: &[ReconciledRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RECONCILED_HEADERS)?;
    for row in rows {
        let s = &row.sensor;
        let h = &row.hierarchy;
        let upper = opt_f64(&s.upper_limit);
        let lower = opt_f64(&s.lower_limit);
        wtr.write_record([
            s.nomenclature_naming.as_str(),
            s.object_name.as_str(),
            opt(&s.description),
            upper.as_str(),
            lower.as_str(),
            opt(&s.object_type),
            opt(&s.units),
            opt(&s.device_id),
            opt(&s.device_ip),
            opt(&s.device_port),
            opt(&s.device_mac),
            opt(&s.polling_mode),
            opt(&s.equipment_location),
            h.location.as_str(),
            h.layer1.as_str(),
            opt(&h.layer2),
            opt(&h.layer3),
            h.serving_area.as_str(),
            h.zone.as_str(),
            row.matched_layer.column_name(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Load a previously written checkpoint.
pub fn read_reconciled_csv<R: Read>(reader: R) -> Result<Vec<ReconciledRow>> {
    let table = read_raw_csv(reader)?;
    table.require_columns(&RECONCILED_HEADERS)?;

    let cols: Vec<usize> = RECONCILED_HEADERS
        .iter()
        .map(|name| table.column_index(name))
        .collect::<Result<_>>()?;

    let get = |row: usize, header: usize| table.cell(row, cols[header]).to_owned();
    let get_opt = |row: usize, header: usize| {
        let v = table.cell(row, cols[header]);
        if v.is_empty() { None } else { Some(v.to_owned()) }
    };
    let get_f64 = |row: usize, header: usize| table.cell(row, cols[header]).parse::<f64>().ok();

    let mut rows = Vec::with_capacity(table.rows.len());
    for i in 0..table.rows.len() {
        let matched = table.cell(i, cols[19]);
        let Some(matched_layer) = MatchedLayer::from_column_name(matched) else {
            return Err(Error::ShapeError(format!(
                "row {i}: unknown {FOUND_IN_COLUMN} value {matched:?}"
            )));
        };
        rows.push(ReconciledRow {
            sensor: SensorRecord {
                nomenclature_naming: get(i, 0),
                object_name: get(i, 1),
                description: get_opt(i, 2),
                upper_limit: get_f64(i, 3),
                lower_limit: get_f64(i, 4),
                object_type: get_opt(i, 5),
                units: get_opt(i, 6),
                device_id: get_opt(i, 7),
                device_ip: get_opt(i, 8),
                device_port: get_opt(i, 9),
                device_mac: get_opt(i, 10),
                polling_mode: get_opt(i, 11),
                equipment_location: get_opt(i, 12),
            },
            hierarchy: crate::model::HierarchyRow {
                location: get(i, 13),
                layer1: get(i, 14),
                layer2: get_opt(i, 15),
                layer3: get_opt(i, 16),
                serving_area: get(i, 17),
                zone: get(i, 18),
            },
            matched_layer,
        });
    }
    Ok(rows)
}
