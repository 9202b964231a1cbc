//! Source extraction: fixed-layout spreadsheet rows to raw ship rows.
//!
//! The header fingerprint is checked first; a mismatch aborts the run.
//! Rows with a bad IMO or no reportable emissions are rejected and counted,
//! and extraction carries on.

mod layout;
mod sheet;

pub use layout::{COMPANY_YEAR, ColumnLayout, HEADER_ROWS};
pub use sheet::{Cell, Sheet, load_sheet};

#[cfg(test)]
pub(crate) use layout::tests::header_for;

use tracing::{debug, info};

use crate::error::{MrvError, Result};
use crate::parser::{parse_imo, parse_number, parse_text};

/// Fuel-per-transport-work cells as published, before applicability rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFpt {
    pub mass: Option<f64>,
    pub volume: Option<f64>,
    pub dwt: Option<f64>,
    pub pax: Option<f64>,
    pub freight: Option<f64>,
}

/// One accepted spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based spreadsheet row number, for diagnostics.
    pub row: usize,
    pub imo: String,
    pub name: String,
    pub ship_type: String,
    pub efficiency: String,
    pub registry: String,
    pub company_imo: String,
    pub company_name: String,
    pub emissions: f64,
    pub fpt: RawFpt,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub rows: Vec<RawRow>,
    /// `MalformedRow` errors, one per rejected row.
    pub rejected: Vec<MrvError>,
}

impl Extraction {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Reads every ship row of `sheet` according to `layout`.
#[tracing::instrument(skip_all, fields(year = layout.year, sheet = %sheet.name))]
pub fn extract(sheet: &Sheet, layout: &ColumnLayout) -> Result<Extraction> {
    if sheet.rows.len() < HEADER_ROWS {
        return Err(MrvError::schema(
            "header",
            format!("{HEADER_ROWS} header rows"),
            format!("{} rows", sheet.rows.len()),
        ));
    }
    layout.verify_header(sheet.row(HEADER_ROWS - 1))?;

    let mut out = Extraction::default();

    for idx in HEADER_ROWS..sheet.rows.len() {
        let cells = sheet.row(idx);
        if cells.iter().all(Cell::is_blank) {
            continue;
        }

        match read_row(sheet, layout, idx) {
            Ok(row) => out.rows.push(row),
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "Row rejected");
                out.rejected.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        accepted = out.rows.len(),
        rejected = out.rejected_count(),
        "Sheet extracted"
    );
    Ok(out)
}

fn read_row(sheet: &Sheet, layout: &ColumnLayout, idx: usize) -> Result<RawRow> {
    let row = idx + 1;
    let cell = |col: usize| sheet.cell(idx, col);
    let text = |col: Option<usize>| col.map(|c| parse_text(cell(c))).unwrap_or_default();

    let imo = parse_imo(cell(layout.imo)).map_err(|reason| MrvError::MalformedRow { row, reason })?;

    let emissions = match parse_number(cell(layout.emissions)) {
        Some(v) if v > 0.0 => v,
        _ => {
            return Err(MrvError::MalformedRow {
                row,
                reason: format!("IMO {imo} has no reportable emissions"),
            });
        }
    };

    Ok(RawRow {
        row,
        imo,
        name: text(Some(layout.name)),
        ship_type: text(Some(layout.ship_type)),
        efficiency: text(Some(layout.efficiency)),
        registry: text(Some(layout.registry)),
        company_imo: text(layout.company_imo),
        company_name: text(layout.company_name),
        emissions,
        fpt: RawFpt {
            mass: parse_number(cell(layout.fpt_mass)),
            volume: parse_number(cell(layout.fpt_volume)),
            dwt: parse_number(cell(layout.fpt_dwt)),
            pax: parse_number(cell(layout.fpt_pax)),
            freight: parse_number(cell(layout.fpt_freight)),
        },
    })
}
