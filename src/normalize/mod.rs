//! Record normalization: raw rows to canonical [`ShipRecord`]s.
//!
//! Each row is tagged with its year's emissions metric, its efficiency text
//! parsed into a typed rating, its flag state resolved, and its
//! fuel-per-transport-work ratios filtered by ship type.
//!
//! An IMO that appears twice in one year keeps its first row; later rows are
//! dropped and counted.

mod fpt;

pub use fpt::{Applicability, applicability, applicable_ratios};

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::RegistryMap;
use crate::error::MrvError;
use crate::extract::RawRow;
use crate::model::{Metric, ShipRecord};
use crate::parser::{parse_efficiency, round2};

#[derive(Debug, Default)]
pub struct Normalization {
    pub records: Vec<ShipRecord>,
    /// Rows dropped because their IMO was already seen this year.
    pub duplicates: usize,
    /// `UnparsableEfficiency` errors; the affected records carry no rating.
    pub unparsable_efficiency: Vec<MrvError>,
}

/// Normalizes one row. The error, if any, is an `UnparsableEfficiency`
/// that left the record's rating empty.
pub fn normalize_row(
    year: u16,
    row: &RawRow,
    registries: &RegistryMap,
) -> (ShipRecord, Option<MrvError>) {
    let (efficiency_rating, error) = match parse_efficiency(&row.efficiency) {
        Ok(rating) => (rating, None),
        Err(e) => (None, Some(e)),
    };

    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    let record = ShipRecord {
        year,
        imo: row.imo.clone(),
        name: row.name.clone(),
        ship_type: row.ship_type.clone(),
        registry: row.registry.clone(),
        flag_state: registries.country_for(&row.registry),
        emissions: Metric::for_year(year).tonnes(round2(row.emissions)),
        efficiency: row.efficiency.clone(),
        efficiency_rating,
        fuel_per_transport: applicable_ratios(&row.ship_type, &row.fpt),
        company_id: non_empty(&row.company_imo),
        company_name: non_empty(&row.company_name),
    };

    (record, error)
}

/// Normalizes every row of one year, keeping the first row per IMO.
#[tracing::instrument(skip_all, fields(year = year, rows = rows.len()))]
pub fn normalize(year: u16, rows: &[RawRow], registries: &RegistryMap) -> Normalization {
    let mut out = Normalization::default();
    let mut seen = HashSet::new();

    for row in rows {
        if !seen.insert(row.imo.as_str()) {
            warn!(imo = %row.imo, row = row.row, "Duplicate IMO dropped");
            out.duplicates += 1;
            continue;
        }

        let (record, error) = normalize_row(year, row, registries);
        if let Some(e) = error {
            debug!(imo = %row.imo, error = %e, "Efficiency left empty");
            out.unparsable_efficiency.push(e);
        }
        out.records.push(record);
    }

    info!(
        records = out.records.len(),
        duplicates = out.duplicates,
        unparsable_efficiency = out.unparsable_efficiency.len(),
        "Rows normalized"
    );
    out
}
