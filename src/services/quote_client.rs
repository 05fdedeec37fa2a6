use crate::config::QuoteApiConfig;
use crate::error::Error;
use crate::models::StockQuote;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for the upstream stock quote proxy
///
/// Quotes are read from `GET {base_url}/{symbol}/quote`.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    base_url: Url,
    client: reqwest::Client,
}

impl QuoteClient {
    /// Create a new quote client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the quote proxy (e.g., "https://stock-price-checker-proxy.freecodecamp.rocks/v1/stock")
    /// * `timeout` - Upper bound for a whole request; hitting it counts as a failed fetch
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        // Trim whitespace and remove trailing slashes from base_url
        let base_url = base_url.trim().trim_end_matches('/');

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid quote API base URL: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid quote API base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "Created QuoteClient");

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &QuoteApiConfig) -> Result<Self, Error> {
        Self::new(&config.quote_api_base, config.timeout())
    }

    /// Build `{base_url}/{symbol}/quote` with the symbol encoded as a single path segment
    pub fn quote_url(&self, symbol: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Quote API base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(symbol)
            .push("quote");
        Ok(url)
    }

    /// Fetch the latest price for a symbol
    ///
    /// Any failure (transport, timeout, status, body) is logged and reported as
    /// `None` so the caller can carry on without a price.
    pub async fn fetch_latest_price(&self, symbol: &str) -> Option<f64> {
        match self.try_fetch_quote(symbol).await {
            Ok(quote) => {
                if quote.latest_price.is_none() {
                    warn!(symbol, "Quote response has no latestPrice");
                }
                quote.latest_price
            }
            Err(e) => {
                warn!(symbol, error = %e, "Quote fetch failed, continuing without price");
                None
            }
        }
    }

    /// Fetch and decode a quote, surfacing the failure reason
    pub async fn try_fetch_quote(&self, symbol: &str) -> Result<StockQuote, Error> {
        let url = self.quote_url(symbol)?;
        debug!(symbol, url = %url, "Fetching quote");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(symbol, &url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::QuoteStatus {
                symbol: symbol.to_string(),
                status,
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(symbol, &url, e))?;

        serde_json::from_str::<StockQuote>(&body)
            .map_err(|e| Error::Parse(format!("Failed to parse quote response for {}: {} (body: {})", symbol, e, body)))
    }
}

/// The client timeout covers the whole exchange, so it can fire while sending or reading the body
fn transport_error(symbol: &str, url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::QuoteTimeout {
            symbol: symbol.to_string(),
        }
    } else {
        Error::Network(format!("Quote request failed: {} (url: {})", err, url))
    }
}
