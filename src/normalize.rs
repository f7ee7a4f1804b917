//! Identifier Normalizer — canonicalize free-form nomenclature codes.
//!
//! A BACnet nomenclature code like `PLGS-C1-AHU01-Z01` encodes, in order:
//! a site prefix, a building code (letter + digit), an equipment code with a
//! running number, and a zone letter with a second number. `normalize` parses
//! that fixed shape and re-renders the numeric groups zero-padded to two
//! digits. Codes that do not fit the shape pass through unchanged and
//! degrade to literal substring matching downstream — fail-open, never an
//! error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `LETTERS-LETTER DIGIT-LETTERS DIGITS-LETTER DIGITS`
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)-([A-Za-z]\d)-([A-Za-z]+)(\d+)-([A-Za-z])(\d+)$")
        .expect("nomenclature pattern is valid")
});

/// Canonical form of a nomenclature code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKey {
    /// The code fit the fixed pattern.
    Structured {
        prefix: String,
        building: String,
        equipment: String,
        number1: u32,
        /// Parsed but excluded from the canonical form; kept so a later
        /// decision to disambiguate by zone does not need a re-parse.
        zone_letter: char,
        number2: u32,
    },
    /// The code did not fit; the original string is used verbatim.
    Raw(String),
}

impl MatchKey {
    /// Full canonical rendering: `prefix-building-equipment-n1-n2`.
    pub fn canonical(&self) -> String {
        match self {
            MatchKey::Structured { prefix, building, equipment, number1, number2, .. } => {
                format!("{prefix}-{building}-{equipment}-{number1:02}-{number2:02}")
            }
            MatchKey::Raw(s) => s.clone(),
        }
    }

    /// The effective search string: the canonical form minus the site
    /// prefix and zone letter, i.e. `building-equipment-n1-n2`.
    pub fn search_string(&self) -> String {
        match self {
            MatchKey::Structured { building, equipment, number1, number2, .. } => {
                format!("{building}-{equipment}-{number1:02}-{number2:02}")
            }
            MatchKey::Raw(s) => s.clone(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, MatchKey::Structured { .. })
    }
}

/// Parse a nomenclature code into its match key. Pure and total.
pub fn normalize(code: &str) -> MatchKey {
    let Some(caps) = CODE_RE.captures(code.trim()) else {
        return MatchKey::Raw(code.to_owned());
    };

    // The pattern guarantees each group's shape; digit groups longer than a
    // u32 would be garbage input, which falls back to the raw code.
    let (Ok(number1), Ok(number2)) = (caps[4].parse::<u32>(), caps[6].parse::<u32>()) else {
        return MatchKey::Raw(code.to_owned());
    };
    let Some(zone_letter) = caps[5].chars().next() else {
        return MatchKey::Raw(code.to_owned());
    };

    MatchKey::Structured {
        prefix: caps[1].to_owned(),
        building: caps[2].to_owned(),
        equipment: caps[3].to_owned(),
        number1,
        zone_letter,
        number2,
    }
}
