use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared HTTP requests. Wrappers add headers or other policy.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
