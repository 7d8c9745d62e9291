//! HTTP transport for real RPC communication

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use super::Transport;
use crate::SdkError;

/// Default node HTTP endpoint
pub const DEFAULT_HTTP_ENDPOINT: &str = "http://localhost:8545";

/// Sent with every request
pub const USER_AGENT: &str = concat!("tessera/", env!("CARGO_PKG_VERSION"));

/// One POST per message
pub struct HttpTransport {
    client: Option<reqwest::Client>,
    url: String,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: None,
            url: url.to_string(),
        }
    }

    fn build_client() -> Result<reqwest::Client, SdkError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| SdkError::Connection(e.to_string()))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_ENDPOINT)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&mut self) -> Result<(), SdkError> {
        if self.client.is_none() {
            self.client = Some(Self::build_client()?);
        }
        Ok(())
    }

    async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, SdkError> {
        self.connect().await?;
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SdkError::Connection(format!("{}: not connected", self.url)))?;

        let response = client
            .post(&self.url)
            .body(request.to_vec())
            .send()
            .await
            .map_err(|e| SdkError::Connection(format!("{}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::Connection(format!("{}: HTTP {}", self.url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SdkError::Connection(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn close(&mut self) -> Result<(), SdkError> {
        self.client = None;
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}
