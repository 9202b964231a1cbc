//! Ranked view types and their published JSON shapes.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::{Emissions, EfficiencyRating, FuelPerTransportWork, Metric, ShipRecord};

/// The documents published for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Ships,
    ByType,
    ByCountry,
    ByCompany,
}

impl View {
    pub const ALL: [View; 4] = [View::Ships, View::ByType, View::ByCountry, View::ByCompany];

    pub fn name(self) -> &'static str {
        match self {
            View::Ships => "ships",
            View::ByType => "by_type",
            View::ByCountry => "countries",
            View::ByCompany => "companies",
        }
    }

    /// Entries kept after ranking; `None` keeps all.
    pub fn limit(self) -> Option<usize> {
        match self {
            View::Ships | View::ByType => None,
            View::ByCountry => Some(20),
            View::ByCompany => Some(15),
        }
    }

    /// Name of the JSON field holding the group key.
    pub(crate) fn key_field(self) -> &'static str {
        match self {
            View::Ships => "imo",
            View::ByType => "type",
            View::ByCountry => "country",
            View::ByCompany => "company",
        }
    }

    pub fn file_name(self, year: u16) -> String {
        match self {
            View::Ships => format!("{year}_ships_data.json"),
            View::ByType => format!("{year}_ships_by_type.json"),
            View::ByCountry => format!("{year}_countries_top20.json"),
            View::ByCompany => format!("{year}_companies_top15.json"),
        }
    }
}

/// One ship with its position in the year's ranking.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankedShip<'a> {
    pub imo: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub ship_type: &'a str,
    pub efficiency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency_rating: Option<EfficiencyRating>,
    pub registry: &'a str,
    /// Empty when the publication names no company.
    pub company: &'a str,
    #[serde(flatten)]
    pub emissions: Emissions,
    pub country: &'a str,
    pub fuel_per_transport: &'a FuelPerTransportWork,
    pub rank: usize,
}

impl<'a> RankedShip<'a> {
    pub fn new(record: &'a ShipRecord, rank: usize) -> Self {
        Self {
            imo: &record.imo,
            name: &record.name,
            ship_type: &record.ship_type,
            efficiency: &record.efficiency,
            efficiency_rating: record.efficiency_rating,
            registry: &record.registry,
            company: record.company_name.as_deref().unwrap_or_default(),
            emissions: record.emissions,
            country: &record.flag_state,
            fuel_per_transport: &record.fuel_per_transport,
            rank,
        }
    }
}

/// The full ship ranking: `{ total_ships, total_<metric>, ships }`.
#[derive(Debug, Clone)]
pub struct ShipRanking<'a> {
    pub year: u16,
    pub metric: Metric,
    /// Rounded sum over every ship.
    pub total: f64,
    pub ships: Vec<RankedShip<'a>>,
}

impl Serialize for ShipRanking<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("total_ships", &self.ships.len())?;
        map.serialize_entry(&format!("total_{}", self.metric.field_name()), &self.total)?;
        map.serialize_entry("ships", &self.ships)?;
        map.end()
    }
}

/// Emissions summed over one group (ship type, country or company).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub emissions: Emissions,
    pub count: usize,
    pub rank: usize,
}

/// A ranked, possibly truncated, grouping for one year.
///
/// Serializes as the bare list of entries, e.g.
/// `[{"type":"Bulk carrier","co2":2000.0,"count":2,"rank":1}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub view: View,
    pub year: u16,
    pub metric: Metric,
    /// Number of groups before truncation.
    pub total_groups: usize,
    pub entries: Vec<GroupTotal>,
}

impl Aggregate {
    pub fn get(&self, key: &str) -> Option<&GroupTotal> {
        self.entries.iter().find(|e| e.key == key)
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| GroupEntry {
                key_field: self.view.key_field(),
                entry,
            })
            .collect();
        entries.serialize(serializer)
    }
}

struct GroupEntry<'a> {
    key_field: &'static str,
    entry: &'a GroupTotal,
}

impl Serialize for GroupEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(self.key_field, &self.entry.key)?;
        map.serialize_entry(
            self.entry.emissions.metric().field_name(),
            &self.entry.emissions.tonnes(),
        )?;
        map.serialize_entry("count", &self.entry.count)?;
        map.serialize_entry("rank", &self.entry.rank)?;
        map.end()
    }
}
