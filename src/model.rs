//! Canonical per-ship records produced by the normalizer.

use serde::Serialize;
use std::fmt;

/// First reporting year published as CO2-equivalent.
pub const EQUIVALENT_FROM_YEAR: u16 = 2024;

/// Which greenhouse-gas quantity a year's emissions column reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// CO2 only (2020–2023).
    Co2,
    /// CO2-equivalent, including methane and nitrous oxide (2024+).
    Co2Eq,
}

impl Metric {
    pub fn for_year(year: u16) -> Self {
        if year >= EQUIVALENT_FROM_YEAR {
            Metric::Co2Eq
        } else {
            Metric::Co2
        }
    }

    /// JSON field name used by the published documents.
    pub fn field_name(self) -> &'static str {
        match self {
            Metric::Co2 => "co2",
            Metric::Co2Eq => "co2eq",
        }
    }

    pub fn tonnes(self, tonnes: f64) -> Emissions {
        match self {
            Metric::Co2 => Emissions::Co2(tonnes),
            Metric::Co2Eq => Emissions::Co2Eq(tonnes),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Emissions in metric tonnes, tagged with the metric they were reported in.
///
/// Flattened into a parent struct this serializes as `"co2": <t>` or
/// `"co2eq": <t>`, the shape the static pages read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Emissions {
    #[serde(rename = "co2")]
    Co2(f64),
    #[serde(rename = "co2eq")]
    Co2Eq(f64),
}

impl Emissions {
    pub fn metric(&self) -> Metric {
        match self {
            Emissions::Co2(_) => Metric::Co2,
            Emissions::Co2Eq(_) => Metric::Co2Eq,
        }
    }

    pub fn tonnes(&self) -> f64 {
        match *self {
            Emissions::Co2(t) | Emissions::Co2Eq(t) => t,
        }
    }
}

/// Design-efficiency standard a rating was assessed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RatingStandard {
    Eedi,
    Eexi,
    Eiv,
}

impl RatingStandard {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "EEDI" => Some(RatingStandard::Eedi),
            "EEXI" => Some(RatingStandard::Eexi),
            "EIV" => Some(RatingStandard::Eiv),
            _ => None,
        }
    }
}

/// Technical efficiency in gCO2 per tonne-nautical-mile. Lower is better;
/// only comparable within one ship type and standard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyRating {
    pub standard: RatingStandard,
    pub value: f64,
}

/// Fuel consumption per transport work, each ratio present only where the
/// ship type has the matching denominator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FuelPerTransportWork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freight: Option<f64>,
}

/// One ship in one reporting year.
///
/// Only `imo` is stable across years; name, type and flag may change.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipRecord {
    pub year: u16,
    pub imo: String,
    pub name: String,
    pub ship_type: String,
    pub registry: String,
    pub flag_state: String,
    pub emissions: Emissions,
    /// Efficiency cell as published.
    pub efficiency: String,
    pub efficiency_rating: Option<EfficiencyRating>,
    pub fuel_per_transport: FuelPerTransportWork,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
}
