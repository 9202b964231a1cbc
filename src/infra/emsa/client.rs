use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, info};

use crate::services::report_catalog::ReportCatalog;
use mrv_rater::fetch::{BasicClient, WithHeaders, fetch_bytes};
use mrv_rater::updates::{LISTING_URL, Listing, Update};

const USER_AGENT: &str = "MRV-Update-Checker/1.0";

/// Client for the EMSA THETIS-MRV public emission-report API.
pub struct EmsaClient {
    listing_url: String,
    api: WithHeaders<BasicClient>,
    downloads: WithHeaders<BasicClient>,
}

impl EmsaClient {
    pub fn new() -> Result<Self> {
        let api = BasicClient::with_timeouts(Duration::from_secs(10), Duration::from_secs(30))?;
        let downloads =
            BasicClient::with_timeouts(Duration::from_secs(10), Duration::from_secs(120))?;

        Ok(Self {
            listing_url: LISTING_URL.to_string(),
            api: WithHeaders::new(
                api,
                [("Accept", "application/json"), ("User-Agent", USER_AGENT)],
            )?,
            downloads: WithHeaders::new(downloads, [("User-Agent", USER_AGENT)])?,
        })
    }
}

#[async_trait]
impl ReportCatalog for EmsaClient {
    async fn list_files(&self) -> Result<Listing> {
        let body = fetch_bytes(&self.api, &self.listing_url)
            .await
            .context("fetching MRV downloadable-files listing")?;
        debug!(bytes = body.len(), "Listing received");

        let listing = Listing::parse(&body).context("parsing MRV listing")?;
        info!(files = listing.results.len(), "MRV listing parsed");
        Ok(listing)
    }

    async fn download(&self, update: &Update) -> Result<Bytes> {
        let url = update.download_url();
        info!(year = %update.year, version = %update.new_version, "Downloading publication");

        fetch_bytes(&self.downloads, &url)
            .await
            .with_context(|| format!("downloading {url}"))
    }
}
