//! Error taxonomy for the MRV ingestion pipeline.
//!
//! Row-level errors ([`MrvError::MalformedRow`], [`MrvError::UnparsableEfficiency`])
//! are absorbed and counted by the pipeline. View-level errors abort only the
//! affected output file. [`MrvError::SchemaMismatch`] aborts the whole run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MrvError {
    /// A spreadsheet row that cannot become a ship record.
    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// Efficiency text that does not follow `"{TYPE} ({value} gCO2/t·nm)"`.
    #[error("unparsable efficiency {0:?}")]
    UnparsableEfficiency(String),

    #[error("view `{view}` is not available for {year}")]
    UnsupportedView { view: &'static str, year: u16 },

    #[error("schema mismatch at {column}: expected {expected}, found {found:?}")]
    SchemaMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Records of one year carry more than one emissions metric.
    #[error("records for {year} mix emission metrics ({expected} and {found})")]
    MetricMismatch {
        year: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(String),
}

impl MrvError {
    /// Row-level errors never abort a run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MrvError::MalformedRow { .. } | MrvError::UnparsableEfficiency(_)
        )
    }

    pub(crate) fn schema(column: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        MrvError::SchemaMismatch {
            column: column.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl From<calamine::Error> for MrvError {
    fn from(e: calamine::Error) -> Self {
        MrvError::Workbook(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MrvError>;
