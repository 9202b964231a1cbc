use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sets fixed headers on every request,
/// e.g. `Accept: application/json` and a `User-Agent` the API operator can
/// identify.
pub struct WithHeaders<C> {
    inner: C,
    headers: HeaderMap,
}

impl<C> WithHeaders<C> {
    /// Validates every `(name, value)` pair up front.
    pub fn new<'a>(inner: C, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        Ok(Self { inner, headers })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for WithHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        for (name, value) in &self.headers {
            req.headers_mut().insert(name.clone(), value.clone());
        }
        self.inner.execute(req).await
    }
}
