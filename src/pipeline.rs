//! One batch run: spreadsheet → records → ranked views → JSON files.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::aggregate::{self, View};
use crate::config::{CompanyGroups, RegistryMap};
use crate::error::Result;
use crate::extract::{self, ColumnLayout, Sheet};
use crate::model::{Metric, ShipRecord};
use crate::normalize;
use crate::output::write_json;

/// What to convert and where to publish it.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub year: u16,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Worksheet to read; defaults to `"{year} Full ERs"`.
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewFailure {
    pub view: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopShip {
    pub rank: usize,
    pub imo: String,
    pub name: String,
    pub tonnes: f64,
}

/// Summary of one run, logged at the end and optionally printed.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub year: u16,
    pub metric: Metric,
    pub rows_read: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub unparsable_efficiency: usize,
    pub views_written: Vec<PathBuf>,
    pub views_skipped: Vec<&'static str>,
    pub views_failed: Vec<ViewFailure>,
    pub top_ships: Vec<TopShip>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.views_failed.is_empty()
    }
}

/// Loads the input named by `opts` and publishes every view for its year.
///
/// Fails only on run-level errors (unknown year, unreadable input, header
/// mismatch). Failing views are listed in the report and leave no file.
#[tracing::instrument(skip_all, fields(year = opts.year, input = %opts.input.display()))]
pub fn convert(
    opts: &ConvertOptions,
    registries: &RegistryMap,
    groups: &CompanyGroups,
) -> Result<RunReport> {
    let layout = ColumnLayout::for_year(opts.year)?;
    let sheet_name = opts
        .sheet
        .clone()
        .unwrap_or_else(|| layout.default_sheet_name());

    info!(sheet = %sheet_name, "Loading spreadsheet");
    let sheet = extract::load_sheet(&opts.input, &sheet_name)?;

    run_sheet(&sheet, &layout, &opts.output_dir, registries, groups)
}

/// Runs extraction, normalization, aggregation and writing over a loaded sheet.
pub fn run_sheet(
    sheet: &Sheet,
    layout: &ColumnLayout,
    output_dir: &Path,
    registries: &RegistryMap,
    groups: &CompanyGroups,
) -> Result<RunReport> {
    let year = layout.year;
    let extraction = extract::extract(sheet, layout)?;
    let normalized = normalize::normalize(year, &extraction.rows, registries);
    let records = &normalized.records;

    let mut report = RunReport {
        year,
        metric: layout.metric,
        rows_read: extraction.rows.len() + extraction.rejected_count(),
        accepted: records.len(),
        rejected: extraction.rejected_count(),
        duplicates: normalized.duplicates,
        unparsable_efficiency: normalized.unparsable_efficiency.len(),
        views_written: Vec::new(),
        views_skipped: Vec::new(),
        views_failed: Vec::new(),
        top_ships: Vec::new(),
    };

    for view in View::ALL {
        if view == View::ByCompany && !layout.supports_companies() {
            info!(view = view.name(), "View not published for this year");
            report.views_skipped.push(view.name());
            continue;
        }

        match publish_view(view, year, records, groups, output_dir) {
            Ok(path) => report.views_written.push(path),
            Err(e) => {
                error!(view = view.name(), error = %e, "View failed, nothing written");
                report.views_failed.push(ViewFailure {
                    view: view.name(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Ok(ranking) = aggregate::rank_ships(year, records) {
        report.top_ships = ranking
            .ships
            .iter()
            .take(3)
            .map(|s| TopShip {
                rank: s.rank,
                imo: s.imo.to_string(),
                name: s.name.to_string(),
                tonnes: s.emissions.tonnes(),
            })
            .collect();
    }

    info!(
        rows_read = report.rows_read,
        accepted = report.accepted,
        rejected = report.rejected,
        duplicates = report.duplicates,
        unparsable_efficiency = report.unparsable_efficiency,
        written = report.views_written.len(),
        failed = report.views_failed.len(),
        "Run complete"
    );
    for ship in &report.top_ships {
        info!(rank = ship.rank, imo = %ship.imo, name = %ship.name, tonnes = ship.tonnes, metric = %layout.metric, "Top ship");
    }

    Ok(report)
}

#[tracing::instrument(skip(view, records, groups, output_dir), fields(view = view.name()))]
fn publish_view(
    view: View,
    year: u16,
    records: &[ShipRecord],
    groups: &CompanyGroups,
    output_dir: &Path,
) -> Result<PathBuf> {
    let file_name = view.file_name(year);
    let grouped = match view {
        View::Ships => {
            let ranking = aggregate::rank_ships(year, records)?;
            info!(ships = ranking.ships.len(), total = ranking.total, "Ship ranking built");
            return write_json(output_dir, &file_name, &ranking);
        }
        View::ByType => aggregate::by_type(year, records)?,
        View::ByCountry => aggregate::by_country(year, records)?,
        View::ByCompany => aggregate::by_company(year, records, groups)?,
    };
    info!(
        groups = grouped.total_groups,
        published = grouped.entries.len(),
        "Aggregate built"
    );
    write_json(output_dir, &file_name, &grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Cell, header_for};

    fn sheet(layout: &ColumnLayout, ships: &[(&str, &str, f64)]) -> Sheet {
        let mut rows = vec![vec![Cell::from("EU MRV")], vec![], header_for(layout)];
        for (imo, ship_type, tonnes) in ships {
            let mut row = vec![Cell::Empty; layout.fpt_freight + 1];
            row[layout.imo] = Cell::from(*imo);
            row[layout.name] = Cell::from("SHIP");
            row[layout.ship_type] = Cell::from(*ship_type);
            row[layout.registry] = Cell::from("Valletta");
            row[layout.emissions] = Cell::Number(*tonnes);
            rows.push(row);
        }
        Sheet::new("test", rows)
    }

    #[test]
    fn test_run_sheet_writes_all_views_for_2024() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ColumnLayout::for_year(2024).unwrap();
        let sheet = sheet(&layout, &[("1000019", "Bulk carrier", 1200.0), ("1000020", "Bulk carrier", 800.0)]);

        let report = run_sheet(
            &sheet,
            &layout,
            dir.path(),
            &RegistryMap::default(),
            &CompanyGroups::default(),
        )
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.views_written.len(), 4);
        assert!(report.views_skipped.is_empty());
        assert_eq!(report.top_ships[0].imo, "1000019");
    }

    #[test]
    fn test_run_sheet_skips_companies_before_2024() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ColumnLayout::for_year(2020).unwrap();
        let sheet = sheet(&layout, &[("1000019", "Tanker", 5.0), ("bad", "Tanker", 5.0)]);

        let report = run_sheet(
            &sheet,
            &layout,
            dir.path(),
            &RegistryMap::default(),
            &CompanyGroups::default(),
        )
        .unwrap();

        assert_eq!(report.views_written.len(), 3);
        assert_eq!(report.views_skipped, vec!["companies"]);
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rejected, 1);
        assert!(!dir.path().join("2020_companies_top15.json").exists());
    }

    #[test]
    fn test_convert_unknown_year_fails() {
        let opts = ConvertOptions {
            year: 2019,
            input: PathBuf::from("missing.xlsx"),
            output_dir: PathBuf::from("json"),
            sheet: None,
        };
        assert!(convert(&opts, &RegistryMap::default(), &CompanyGroups::default()).is_err());
    }
}
