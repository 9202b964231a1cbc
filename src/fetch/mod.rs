//! Minimal HTTP layer for the regulator's public API.

mod basic;
mod client;
mod headers;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use headers::WithHeaders;

use anyhow::Result;
use bytes::Bytes;

/// GETs `url`, failing on non-success status codes.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?)
}
