//! Ranked views over one year's normalized records.
//!
//! Every view is sorted by emissions, largest first, with ties broken by the
//! ascending IMO or group key. Totals are summed over the complete record
//! set; truncation to a view's top-N happens only after sorting.

mod company;
pub mod types;

pub use types::{Aggregate, GroupTotal, RankedShip, ShipRanking, View};

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::CompanyGroups;
use crate::error::{MrvError, Result};
use crate::extract::COMPANY_YEAR;
use crate::model::{Metric, ShipRecord};
use crate::parser::round2;

/// Returns the metric of `year`, checking that every record carries it.
pub fn year_metric(year: u16, records: &[ShipRecord]) -> Result<Metric> {
    let expected = Metric::for_year(year);
    match records.iter().find(|r| r.emissions.metric() != expected) {
        Some(r) => Err(MrvError::MetricMismatch {
            year,
            expected: expected.field_name(),
            found: r.emissions.metric().field_name(),
        }),
        None => Ok(expected),
    }
}

fn by_emissions_desc(a_tonnes: f64, a_key: &str, b_tonnes: f64, b_key: &str) -> Ordering {
    b_tonnes
        .total_cmp(&a_tonnes)
        .then_with(|| a_key.cmp(b_key))
}

/// Ranks every ship of the year; rank 1 is the largest emitter.
pub fn rank_ships(year: u16, records: &[ShipRecord]) -> Result<ShipRanking<'_>> {
    let metric = year_metric(year, records)?;

    let mut sorted: Vec<&ShipRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        by_emissions_desc(a.emissions.tonnes(), &a.imo, b.emissions.tonnes(), &b.imo)
    });

    let total = round2(records.iter().map(|r| r.emissions.tonnes()).sum());
    let ships = sorted
        .into_iter()
        .enumerate()
        .map(|(i, r)| RankedShip::new(r, i + 1))
        .collect();

    Ok(ShipRanking {
        year,
        metric,
        total,
        ships,
    })
}

/// Totals per ship type, all types kept.
pub fn by_type(year: u16, records: &[ShipRecord]) -> Result<Aggregate> {
    let totals = group_totals(records, |r| Some(r.ship_type.as_str()));
    ranked(View::ByType, year, year_metric(year, records)?, totals)
}

/// Totals per flag state, top 20. Ships without a country are left out.
pub fn by_country(year: u16, records: &[ShipRecord]) -> Result<Aggregate> {
    let totals = group_totals(records, |r| {
        (!r.flag_state.is_empty()).then_some(r.flag_state.as_str())
    });
    ranked(View::ByCountry, year, year_metric(year, records)?, totals)
}

/// Totals per company or company group, top 15. Only the 2024 publication
/// names companies; any other year is `UnsupportedView`.
pub fn by_company(year: u16, records: &[ShipRecord], groups: &CompanyGroups) -> Result<Aggregate> {
    if year != COMPANY_YEAR {
        return Err(MrvError::UnsupportedView {
            view: View::ByCompany.name(),
            year,
        });
    }
    let metric = year_metric(year, records)?;
    ranked(View::ByCompany, year, metric, company::company_totals(records, groups))
}

fn group_totals<'a>(
    records: &'a [ShipRecord],
    key: impl Fn(&'a ShipRecord) -> Option<&'a str>,
) -> BTreeMap<String, (f64, usize)> {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            let total = totals.entry(k.to_string()).or_default();
            total.0 += record.emissions.tonnes();
            total.1 += 1;
        }
    }
    totals
}

fn ranked(
    view: View,
    year: u16,
    metric: Metric,
    totals: BTreeMap<String, (f64, usize)>,
) -> Result<Aggregate> {
    let mut entries: Vec<GroupTotal> = totals
        .into_iter()
        .map(|(key, (tonnes, count))| GroupTotal {
            key,
            emissions: metric.tonnes(round2(tonnes)),
            count,
            rank: 0,
        })
        .collect();

    entries.sort_by(|a, b| {
        by_emissions_desc(a.emissions.tonnes(), &a.key, b.emissions.tonnes(), &b.key)
    });
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    let total_groups = entries.len();
    if let Some(limit) = view.limit() {
        entries.truncate(limit);
    }

    Ok(Aggregate {
        view,
        year,
        metric,
        total_groups,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Emissions, FuelPerTransportWork};

    #[test]
    fn test_bulk_carrier_example() {
        let records = vec![
            record(2022, "1000020", "Bulk carrier", "Greece", 800.0),
            record(2022, "1000019", "Bulk carrier", "Greece", 1200.0),
        ];

        let types = by_type(2022, &records).unwrap();
        let bulk = types.get("Bulk carrier").unwrap();
        assert_eq!(bulk.emissions, Emissions::Co2(2000.0));
        assert_eq!(bulk.count, 2);

        let ships = rank_ships(2022, &records).unwrap();
        assert_eq!(ships.ships[0].imo, "1000019");
        assert_eq!(ships.ships[0].rank, 1);
        assert_eq!(ships.ships[1].imo, "1000020");
        assert_eq!(ships.total, 2000.0);
    }

    #[test]
    fn test_ties_break_by_ascending_key() {
        let records = vec![
            record(2021, "1000030", "Tanker", "Malta", 50.0),
            record(2021, "1000010", "Tanker", "Liberia", 50.0),
        ];

        let ships = rank_ships(2021, &records).unwrap();
        assert_eq!(ships.ships[0].imo, "1000010");

        let countries = by_country(2021, &records).unwrap();
        assert_eq!(countries.entries[0].key, "Liberia");
        assert_eq!(countries.entries[1].key, "Malta");
        assert_eq!(countries.entries[1].rank, 2);
    }

    #[test]
    fn test_country_top20_truncates_after_sorting() {
        let records: Vec<_> = (0..25)
            .map(|i| {
                record(
                    2023,
                    &format!("{}", 1000000 + i),
                    "Tanker",
                    &format!("Country {i:02}"),
                    (i + 1) as f64,
                )
            })
            .collect();

        let countries = by_country(2023, &records).unwrap();
        assert_eq!(countries.entries.len(), 20);
        assert_eq!(countries.total_groups, 25);
        assert_eq!(countries.entries[0].key, "Country 24");
        assert_eq!(countries.entries[19].key, "Country 05");
    }

    #[test]
    fn test_empty_country_left_out() {
        let records = vec![
            record(2023, "1000001", "Tanker", "", 10.0),
            record(2023, "1000002", "Tanker", "Panama", 5.0),
        ];
        let countries = by_country(2023, &records).unwrap();
        assert_eq!(countries.entries.len(), 1);
    }

    #[test]
    fn test_company_view_only_for_2024() {
        let records = vec![record(2023, "1000001", "Tanker", "Panama", 5.0)];
        let err = by_company(2023, &records, &CompanyGroups::default()).unwrap_err();
        assert!(matches!(err, MrvError::UnsupportedView { year: 2023, .. }));
    }

    #[test]
    fn test_company_view_top15() {
        let records: Vec<_> = (0..20)
            .map(|i| {
                let mut r = record(2024, &format!("{}", 1000000 + i), "Tanker", "Panama", 1.0 + i as f64);
                r.company_id = Some(format!("{}", 2000000 + i));
                r.company_name = Some(format!("Owner {i:02}"));
                r
            })
            .collect();

        let companies = by_company(2024, &records, &CompanyGroups::default()).unwrap();
        assert_eq!(companies.entries.len(), 15);
        assert_eq!(companies.entries[0].key, "Owner 19");
        assert_eq!(companies.metric, Metric::Co2Eq);
    }

    #[test]
    fn test_mixed_metrics_rejected() {
        let mut records = vec![record(2024, "1000001", "Tanker", "Panama", 5.0)];
        records[0].emissions = Emissions::Co2(5.0);
        assert!(matches!(
            by_type(2024, &records),
            Err(MrvError::MetricMismatch { .. })
        ));
        assert!(rank_ships(2024, &records).is_err());
    }

    #[test]
    fn test_group_totals_equal_record_sums() {
        let records = vec![
            record(2022, "1000001", "Tanker", "Malta", 10.25),
            record(2022, "1000002", "Bulk carrier", "Malta", 3.5),
            record(2022, "1000003", "Tanker", "Cyprus", 7.25),
        ];

        let types = by_type(2022, &records).unwrap();
        for entry in &types.entries {
            let expected: f64 = records
                .iter()
                .filter(|r| r.ship_type == entry.key)
                .map(|r| r.emissions.tonnes())
                .sum();
            assert_eq!(entry.emissions.tonnes(), round2(expected));
        }
        assert_eq!(by_country(2022, &records).unwrap().get("Malta").unwrap().count, 2);
    }

    // Helper functions for tests
    fn record(year: u16, imo: &str, ship_type: &str, country: &str, tonnes: f64) -> ShipRecord {
        ShipRecord {
            year,
            imo: imo.to_string(),
            name: format!("SHIP {imo}"),
            ship_type: ship_type.to_string(),
            registry: country.to_string(),
            flag_state: country.to_string(),
            emissions: Metric::for_year(year).tonnes(tonnes),
            efficiency: String::new(),
            efficiency_rating: None,
            fuel_per_transport: FuelPerTransportWork::default(),
            company_id: None,
            company_name: None,
        }
    }
}
