//! Runtime configuration
//!
//! Every setting can be passed as a flag or through the environment, and is
//! read once at startup.

use clap::Args;
use std::time::Duration;

/// Default upstream quote proxy
pub const DEFAULT_QUOTE_API_BASE: &str = "https://stock-price-checker-proxy.freecodecamp.rocks/v1/stock";

/// Default SQLite connection string
pub const DEFAULT_DATABASE_URL: &str = "sqlite://stock_prices.db";

/// Persistent store settings
#[derive(Args, Debug, Clone)]
pub struct StoreConfig {
    /// SQLite connection string (e.g. sqlite://stock_prices.db)
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}

/// Upstream quote provider settings
#[derive(Args, Debug, Clone)]
pub struct QuoteApiConfig {
    /// Base URL of the quote proxy; quotes are read from {base}/{symbol}/quote
    #[arg(long, env = "QUOTE_API_BASE", default_value = DEFAULT_QUOTE_API_BASE)]
    pub quote_api_base: String,

    /// Timeout for a single upstream quote request, in seconds
    #[arg(long, env = "QUOTE_TIMEOUT_SECS", default_value_t = 10)]
    pub quote_timeout_secs: u64,
}

impl QuoteApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }
}

/// Settings for the `serve` command
#[derive(Args, Debug, Clone)]
pub struct ServiceConfig {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Take the requester address from X-Forwarded-For when running behind a proxy
    #[arg(long, env = "TRUST_PROXY", default_value_t = false)]
    pub trust_proxy: bool,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub quote_api: QuoteApiConfig,
}
