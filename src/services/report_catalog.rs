//! Trait for a source of published emission-report spreadsheets.

use anyhow::Result;
use bytes::Bytes;
use mrv_rater::updates::{Listing, Update};

/// Abstraction over the regulator's download API.
#[async_trait::async_trait]
pub trait ReportCatalog {
    /// Lists the currently published file per reporting period.
    async fn list_files(&self) -> Result<Listing>;

    /// Downloads the spreadsheet named by `update`.
    async fn download(&self, update: &Update) -> Result<Bytes>;
}
