use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::errors::FetchError;
use crate::types::DemographicsArguments;

/// Anything that can answer a demographics query with a raw JSON payload.
///
/// Every `Err` returned here is an upstream failure and is reported to the
/// caller as data, never as a protocol error.
#[async_trait]
pub trait DemographicsSource: Send + Sync {
    async fn fetch(&self, args: &DemographicsArguments) -> Result<Value, FetchError>;
}

/// Client for the UNHCR population API demographics endpoint
#[derive(Debug, Clone)]
pub struct DemographicsClient {
    client: Client,
    api_url: String,
    timeout: Duration,
}

impl DemographicsClient {
    /// Create a client from server configuration
    pub fn new(config: &ServerConfig) -> Result<Self, FetchError> {
        Self::build(config.api_url(), config.timeout(), &config.user_agent())
    }

    /// Create a client for an explicit endpoint and timeout
    pub fn with_endpoint(api_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        Self::build(api_url, timeout, &ServerConfig::default().user_agent())
    }

    fn build(api_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            timeout,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Request(e)
        }
    }
}

#[async_trait]
impl DemographicsSource for DemographicsClient {
    async fn fetch(&self, args: &DemographicsArguments) -> Result<Value, FetchError> {
        let query = args.query_pairs();
        log::debug!("GET {} {:?}", self.api_url, query);

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            return Err(FetchError::HttpStatus {
                status_code: status.as_u16(),
                message: format!(
                    "{} for url: {}",
                    status.canonical_reason().unwrap_or("Unexpected status"),
                    url
                ),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
