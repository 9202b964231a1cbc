use super::client::HttpClient;
use async_trait::async_trait;
use std::time::Duration;

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// A client with connect and overall timeouts; spreadsheet downloads are
    /// tens of megabytes, so `timeout` should be generous.
    pub fn with_timeouts(connect: Duration, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect)
            .timeout(timeout)
            .build()?;
        Ok(Self(client))
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
