//! Loading a worksheet (xlsx/xls/xlsb/ods via calamine, or a CSV export)
//! into a dense grid of [`Cell`]s.

use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::debug;

use crate::error::{MrvError, Result};

/// A spreadsheet value, reduced to what the parsers care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

static EMPTY: Cell = Cell::Empty;

/// One worksheet; row 0 is the first spreadsheet row.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Returns the cell at `(row, col)`, or [`Cell::Empty`] past the edges.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Loads the sheet to process from `path`.
///
/// CSV files are taken as a single sheet. Workbooks use `sheet_name` when
/// present; a workbook with exactly one sheet falls back to that sheet.
pub fn load_sheet(path: &Path, sheet_name: &str) -> Result<Sheet> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        load_csv(path)
    } else {
        load_workbook(path, sheet_name)
    }
}

fn load_csv(path: &Path) -> Result<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in rdr.byte_records() {
        let record = record?;
        rows.push(record.iter().map(|field| Cell::from(decode_field(field).as_str())).collect());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("csv")
        .to_string();
    debug!(path = %path.display(), rows = rows.len(), "CSV sheet loaded");
    Ok(Sheet::new(name, rows))
}

/// Excel exports CSV in the system code page; fields that are not UTF-8
/// are read as Latin-1.
fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(s) => s.to_string(),
        Err(_) => field.iter().map(|&b| char::from(b)).collect(),
    }
}

fn load_workbook(path: &Path, sheet_name: &str) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();

    let name = if names.iter().any(|n| n == sheet_name) {
        sheet_name.to_string()
    } else if names.len() == 1 {
        names[0].clone()
    } else {
        return Err(MrvError::schema(
            "sheet",
            sheet_name,
            names.join(", "),
        ));
    };

    let range = workbook.worksheet_range(&name)?;

    // calamine ranges start at the first used cell, not at A1
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for data_row in range.rows() {
        let mut row = vec![Cell::Empty; col_offset];
        row.extend(data_row.iter().map(Cell::from));
        rows.push(row);
    }

    debug!(path = %path.display(), sheet = %name, rows = rows.len(), "Workbook sheet loaded");
    Ok(Sheet::new(name, rows))
}
