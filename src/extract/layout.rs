//! Column layouts of the regulator's yearly publication.

use crate::error::{MrvError, Result};
use crate::extract::Cell;
use crate::model::Metric;
use crate::parser::parse_text;

/// Rows above the first ship row. The last of them carries the column titles.
pub const HEADER_ROWS: usize = 3;

/// The only reporting year whose publication names the company (DoC holder).
pub const COMPANY_YEAR: u16 = 2024;

/// Fixed column indices for one reporting year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub year: u16,
    pub metric: Metric,
    pub imo: usize,
    pub name: usize,
    pub ship_type: usize,
    pub efficiency: usize,
    pub registry: usize,
    pub company_imo: Option<usize>,
    pub company_name: Option<usize>,
    pub emissions: usize,
    pub fpt_mass: usize,
    pub fpt_volume: usize,
    pub fpt_dwt: usize,
    pub fpt_pax: usize,
    pub fpt_freight: usize,
}

impl ColumnLayout {
    /// Returns the layout for `year`, or `SchemaMismatch` when none is known.
    pub fn for_year(year: u16) -> Result<Self> {
        match year {
            2020..=2023 => Ok(Self {
                year,
                metric: Metric::Co2,
                imo: 0,
                name: 1,
                ship_type: 2,
                efficiency: 4,
                registry: 5,
                company_imo: None,
                company_name: None,
                emissions: 24,
                fpt_mass: 34,
                fpt_volume: 35,
                fpt_dwt: 36,
                fpt_pax: 37,
                fpt_freight: 38,
            }),
            COMPANY_YEAR => Ok(Self {
                year,
                metric: Metric::Co2Eq,
                imo: 0,
                name: 1,
                ship_type: 2,
                efficiency: 4,
                registry: 5,
                company_imo: Some(8),
                company_name: Some(9),
                emissions: 58,
                fpt_mass: 74,
                fpt_volume: 76,
                fpt_dwt: 78,
                fpt_pax: 80,
                fpt_freight: 82,
            }),
            _ => Err(MrvError::schema(
                "year",
                "a reporting year between 2020 and 2024",
                year.to_string(),
            )),
        }
    }

    pub fn supports_companies(&self) -> bool {
        self.company_imo.is_some()
    }

    pub fn default_sheet_name(&self) -> String {
        format!("{} Full ERs", self.year)
    }

    /// Checks the column titles before any index is trusted.
    pub fn verify_header(&self, header: &[Cell]) -> Result<()> {
        let title = |col: usize| header.get(col).map(parse_text).unwrap_or_default();

        let mut checks = vec![
            (self.imo, "imo"),
            (self.name, "name"),
            (self.ship_type, "shiptype"),
            (self.registry, "portofregistry"),
            (self.fpt_mass, "transportwork(mass)"),
        ];
        match self.metric {
            Metric::Co2 => checks.push((self.emissions, "co2emissions")),
            Metric::Co2Eq => checks.push((self.emissions, "co2eq")),
        }

        for (col, keyword) in checks {
            let found = title(col);
            if !fingerprint(&found).contains(keyword) {
                return Err(MrvError::schema(format!("column {col}"), keyword, found));
            }
        }

        // A CO2-only year must not silently read an equivalent column.
        if self.metric == Metric::Co2 {
            let found = title(self.emissions);
            if fingerprint(&found).contains("co2eq") {
                return Err(MrvError::schema(
                    format!("column {}", self.emissions),
                    "co2emissions",
                    found,
                ));
            }
        }

        Ok(())
    }
}

/// Lowercase, whitespace-free, with the subscript two folded to `2`.
fn fingerprint(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '₂' { '2' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}
