/*
[INPUT]:  HTTP configuration (base URL, timeouts, user agent) and Request values
[OUTPUT]: Raw response bodies or typed results; API errors mapped to BinanceError
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{BinanceError, Result};
use super::request::Request;

/// Base URL for the public Binance web API
pub const BASE_URL: &str = "https://www.binance.com";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("binance-adapter/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Main HTTP client for the Binance REST API
#[derive(Debug, Clone)]
pub struct BinanceClient {
    http_client: Client,
    base_url: Url,
}

impl BinanceClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, BASE_URL)
    }

    /// Create a client against another host, e.g. a mock server
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, request: &Request) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{}", request.endpoint))?;
        let query = request.query_string();
        if !query.is_empty() {
            let merged = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
                _ => query,
            };
            url.set_query(Some(&merged));
        }
        Ok(url)
    }

    /// Sends `request` and returns the raw body.
    ///
    /// Any status >= 400 becomes [`BinanceError::Api`] with the decoded
    /// `{code, msg}` body.
    pub async fn send_request(&self, request: Request) -> Result<Vec<u8>> {
        let url = self.url(&request)?;
        let mut builder = self.http_client.request(request.method.clone(), url.clone());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.form_body() {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        debug!(method = %request.method, url = %url, "http request");
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.as_u16() >= 400 {
            let err = BinanceError::api_error(status, &body);
            warn!(url = %url, error = %err, "http request failed");
            return Err(err);
        }
        Ok(body.to_vec())
    }

    /// [`Self::send_request`] followed by a JSON decode of the body
    pub async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let body = self.send_request(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
