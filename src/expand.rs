//! Hierarchy Expander — raw ACMV table to atomic hierarchy rows.
//!
//! The source spreadsheet writes a label once and lets it apply to the rows
//! below (forward fill), and packs several entries into one cell with
//! `" & "` conjunctions or `"<prefix>-<start> to <end>"` ranges. Expansion
//! replaces every source row by the full cross-product of its per-column
//! atomic value sets, each combination carrying the row's `Location` and
//! `Zone` unchanged.

use std::sync::LazyLock;

use regex::Regex;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::model::HierarchyRow;
use crate::table::{RawTable, HIERARCHY_COLUMNS};
use crate::Result;

/// `<prefix-><start> to <end>`, prefix up to and including the last dash.
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*-)(\d+)\s+to\s+(\d+)$").expect("range pattern is valid")
});

type ValueSet = SmallVec<[String; 4]>;

/// Expand one cell into its atomic values.
///
/// `" & "`-joined parts are independent alternatives; each part may itself
/// be a numeric range. An empty cell yields an empty set.
fn expand_cell(cell: &str) -> ValueSet {
    let mut values = ValueSet::new();
    for part in cell.split(" & ") {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some(caps) = RANGE_RE.captures(part) {
            let prefix = &caps[1];
            let (start, end) = (caps[2].parse::<u32>(), caps[3].parse::<u32>());
            if let (Ok(start), Ok(end)) = (start, end) {
                if start <= end {
                    for n in start..=end {
                        values.push(format!("{prefix}{n:02}"));
                    }
                    continue;
                }
            }
        }
        values.push(part.to_owned());
    }
    values
}

/// A row is discarded when it is entirely empty except possibly `Zone`.
fn is_discardable(location: &str, l1: &str, l2: &str, l3: &str, serving: &str) -> bool {
    [location, l1, l2, l3, serving].iter().all(|c| c.is_empty())
}

/// Expand the raw hierarchy table into atomic `HierarchyRow`s.
///
/// Fails fast when a required column is missing; never fails on cell
/// content. Output ordering is not significant downstream.
pub fn expand(table: &RawTable) -> Result<Vec<HierarchyRow>> {
    table.require_columns(&HIERARCHY_COLUMNS)?;
    let [loc_i, l1_i, l2_i, l3_i, sa_i, zone_i] = [
        table.column_index("Location")?,
        table.column_index("1st Layer")?,
        table.column_index("2nd Layer")?,
        table.column_index("3rd Layer")?,
        table.column_index("Serving Area")?,
        table.column_index("Zone")?,
    ];

    let mut out = Vec::new();
    // Forward-fill carries for Location, 1st Layer and Serving Area.
    let mut last_location = String::new();
    let mut last_layer1 = String::new();
    let mut last_serving = String::new();

    for row in 0..table.rows.len() {
        let location = table.cell(row, loc_i).trim().to_owned();
        let layer1 = table.cell(row, l1_i).trim().to_owned();
        let layer2 = table.cell(row, l2_i).trim().to_owned();
        let layer3 = table.cell(row, l3_i).trim().to_owned();
        let serving = table.cell(row, sa_i).trim().to_owned();
        let zone = table.cell(row, zone_i).trim().to_owned();

        if is_discardable(&location, &layer1, &layer2, &layer3, &serving) {
            continue;
        }

        if !location.is_empty() {
            last_location = location;
        }
        if !layer1.is_empty() {
            last_layer1 = layer1;
        }
        if !serving.is_empty() {
            last_serving = serving;
        }

        // Invariant: layer1 and serving area are never both absent on an
        // expanded row. A row with neither (even after forward fill) has
        // nothing to match or serve.
        if last_layer1.is_empty() && last_serving.is_empty() {
            debug!(row, "dropping hierarchy row with no layer1 and no serving area");
            continue;
        }

        let layer1_set = non_empty_or_blank(expand_cell(&last_layer1));
        let layer2_set = optional_set(expand_cell(&layer2));
        let layer3_set = optional_set(expand_cell(&layer3));
        let serving_set = non_empty_or_blank(expand_cell(&last_serving));

        for l1 in &layer1_set {
            for l2 in &layer2_set {
                for l3 in &layer3_set {
                    for sa in &serving_set {
                        out.push(HierarchyRow {
                            location: last_location.clone(),
                            layer1: l1.clone(),
                            layer2: l2.clone(),
                            layer3: l3.clone(),
                            serving_area: sa.clone(),
                            zone: zone.clone(),
                        });
                    }
                }
            }
        }
    }

    info!(
        source_rows = table.rows.len(),
        expanded_rows = out.len(),
        "hierarchy expanded"
    );
    Ok(out)
}

/// Required columns still cross-multiply when empty: a blank entry stands in
/// so the other columns' values are not lost.
fn non_empty_or_blank(set: ValueSet) -> ValueSet {
    if set.is_empty() {
        let mut blank = ValueSet::new();
        blank.push(String::new());
        blank
    } else {
        set
    }
}

/// Optional layers cross-multiply as `None` when the cell is empty.
fn optional_set(set: ValueSet) -> SmallVec<[Option<String>; 4]> {
    if set.is_empty() {
        let mut none = SmallVec::new();
        none.push(None);
        none
    } else {
        set.into_iter().map(Some).collect()
    }
}
