//! Cell-level parsers for MRV spreadsheet values.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{MrvError, Result};
use crate::extract::Cell;
use crate::model::{EfficiencyRating, RatingStandard};

/// Placeholder texts the regulator uses for "no value".
const ABSENT_MARKERS: &[&str] = &["", "N/A", "Division by zero!", "0", "0.0"];

/// Efficiency texts that mean the ship has no applicable rating.
const NO_RATING_MARKERS: &[&str] = &["", "N/A", "Not Applicable", "Not applicable"];

static EFFICIENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(EEDI|EEXI|EIV)\s*\(\s*([0-9]+(?:[.,][0-9]+)?)\s*gCO[2₂]\s*/\s*t\s*[·.\- ]?\s*n\s*m(?:ile)?\s*\)\s*$",
    )
    .expect("efficiency pattern is valid")
});

/// Renders a cell as trimmed text. Integral numbers print without a fraction
/// so that IMO cells stored as numbers read back as `"9123456"`.
pub fn parse_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
        Cell::Number(v) => v.to_string(),
    }
}

/// Parses a numeric cell, treating zero and the regulator's placeholders as absent.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Empty => return None,
        Cell::Number(v) => *v,
        Cell::Text(s) => {
            let s = s.trim();
            if ABSENT_MARKERS.contains(&s) {
                return None;
            }
            s.parse::<f64>().ok()?
        }
    };

    if !value.is_finite() || value == 0.0 {
        None
    } else {
        Some(value)
    }
}

/// Validates an IMO cell: exactly seven ASCII digits.
///
/// Returns the reason on failure so the caller can build a `MalformedRow`.
pub fn parse_imo(cell: &Cell) -> std::result::Result<String, String> {
    let imo = parse_text(cell);
    if imo.is_empty() || imo == "N/A" {
        return Err("missing IMO".to_string());
    }
    if imo.len() != 7 || !imo.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid IMO {imo:?}"));
    }
    Ok(imo)
}

/// Parses `"{EEDI|EEXI|EIV} ({value} gCO2/t·nm)"`.
///
/// Blank or "not applicable" text yields `Ok(None)`; anything else that does
/// not match yields [`MrvError::UnparsableEfficiency`].
pub fn parse_efficiency(text: &str) -> Result<Option<EfficiencyRating>> {
    let text = text.trim();
    if NO_RATING_MARKERS.contains(&text) {
        return Ok(None);
    }

    let caps = EFFICIENCY_RE
        .captures(text)
        .ok_or_else(|| MrvError::UnparsableEfficiency(text.to_string()))?;

    let standard = RatingStandard::from_label(&caps[1])
        .ok_or_else(|| MrvError::UnparsableEfficiency(text.to_string()))?;
    let value = caps[2]
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| MrvError::UnparsableEfficiency(text.to_string()))?;

    Ok(Some(EfficiencyRating { standard, value }))
}

/// Rounds to two decimals, the precision of every published figure.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
