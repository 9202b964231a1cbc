//! Company labelling for the company view.
//!
//! Ships are first totalled per company IMO. Company IMOs belonging to a
//! configured group take the group's label; any other company IMO is labelled
//! by the company name most of its ships report.

use std::collections::BTreeMap;

use crate::config::CompanyGroups;
use crate::model::ShipRecord;

#[derive(Debug, Default)]
struct CompanyTally<'a> {
    tonnes: f64,
    count: usize,
    names: BTreeMap<&'a str, usize>,
}

impl CompanyTally<'_> {
    /// Most frequent name; on a tie the alphabetically first wins.
    fn label(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (&name, &n) in &self.names {
            if name.is_empty() {
                continue;
            }
            if best.is_none_or(|(_, b)| n > b) {
                best = Some((name, n));
            }
        }
        best.map(|(name, _)| name)
    }
}

/// Per-label `(tonnes, ship count)`, unrounded. Ships whose company has neither
/// a group nor a name are left out.
pub(crate) fn company_totals(
    records: &[ShipRecord],
    groups: &CompanyGroups,
) -> BTreeMap<String, (f64, usize)> {
    let mut by_imo: BTreeMap<&str, CompanyTally> = BTreeMap::new();
    for record in records {
        let tally = by_imo
            .entry(record.company_id.as_deref().unwrap_or(""))
            .or_default();
        tally.tonnes += record.emissions.tonnes();
        tally.count += 1;
        *tally
            .names
            .entry(record.company_name.as_deref().unwrap_or(""))
            .or_default() += 1;
    }

    let mut by_label: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (company_imo, tally) in &by_imo {
        let label = match groups.group_of(company_imo) {
            Some(group) => group,
            None => match tally.label() {
                Some(name) => name,
                None => continue,
            },
        };
        let total = by_label.entry(label.to_string()).or_default();
        total.0 += tally.tonnes;
        total.1 += tally.count;
    }

    by_label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Emissions, FuelPerTransportWork};

    #[test]
    fn test_group_members_merge() {
        let records = vec![
            record("1000001", Some("5808451"), "Maersk A/S", 100.0),
            record("1000002", Some("1135952"), "Maersk Line Ltd", 50.0),
            record("1000003", Some("7777777"), "Small Owner", 10.0),
        ];

        let totals = company_totals(&records, &CompanyGroups::default());
        assert_eq!(totals["Maersk"], (150.0, 2));
        assert_eq!(totals["Small Owner"], (10.0, 1));
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_most_common_name_labels_company() {
        let records = vec![
            record("1000001", Some("7777777"), "Acme Shipping", 1.0),
            record("1000002", Some("7777777"), "ACME SHIPPING LTD", 1.0),
            record("1000003", Some("7777777"), "ACME SHIPPING LTD", 1.0),
        ];

        let totals = company_totals(&records, &CompanyGroups::default());
        assert_eq!(totals.len(), 1);
        assert_eq!(totals["ACME SHIPPING LTD"], (3.0, 3));
    }

    #[test]
    fn test_name_tie_breaks_alphabetically() {
        let records = vec![
            record("1000001", Some("7777777"), "Beta", 1.0),
            record("1000002", Some("7777777"), "Alpha", 1.0),
        ];

        let totals = company_totals(&records, &CompanyGroups::default());
        assert!(totals.contains_key("Alpha"));
    }

    #[test]
    fn test_unnamed_company_is_left_out() {
        let records = vec![record("1000001", None, "", 5.0)];
        assert!(company_totals(&records, &CompanyGroups::default()).is_empty());
    }

    fn record(imo: &str, company_id: Option<&str>, company_name: &str, tonnes: f64) -> ShipRecord {
        ShipRecord {
            year: 2024,
            imo: imo.to_string(),
            name: String::new(),
            ship_type: "Container ship".to_string(),
            registry: String::new(),
            flag_state: String::new(),
            emissions: Emissions::Co2Eq(tonnes),
            efficiency: String::new(),
            efficiency_rating: None,
            fuel_per_transport: FuelPerTransportWork::default(),
            company_id: company_id.map(str::to_string),
            company_name: (!company_name.is_empty()).then(|| company_name.to_string()),
        }
    }
}
