use crate::error::{AppError, Result};
use crate::models::{StockPricesResponse, StockRecord};
use crate::server::AppState;
use crate::services::{RequestMetrics, RequestStatus};
use axum::{
    extract::{ConnectInfo, Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Query, QueryRejection};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, error, instrument, warn};

/// Most symbols a single request may compare
pub const MAX_SYMBOLS: usize = 2;

/// Query parameters for /api/stock-prices
#[derive(Debug, Deserialize, Clone)]
pub struct StockPricesQuery {
    /// Ticker symbols (can be repeated: stock=GOOG&stock=MSFT)
    pub stock: Option<Vec<String>>,

    /// "true" or "1" registers a like from the requester; repeated values never do
    pub like: Option<Vec<String>>,
}

/// One entry of a 400 response, shaped like express-validator errors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub msg: String,
    pub path: &'static str,
    pub location: &'static str,
}

impl ValidationError {
    fn query(path: &'static str, value: &str, msg: &str) -> Self {
        Self {
            kind: "field",
            value: value.to_string(),
            msg: msg.to_string(),
            path,
            location: "query",
        }
    }

    /// Query string that could not be decoded at all; not tied to a single field
    fn malformed(msg: &str) -> Self {
        Self {
            kind: "malformed",
            value: String::new(),
            msg: msg.to_string(),
            path: "",
            location: "query",
        }
    }
}

/// Health statistics
#[derive(Debug, Clone, Serialize)]
pub struct HealthStats {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub stock_count: i64,
    pub like_count: i64,
    pub current_system_time: String,
}

/// GET /api/stock-prices - Latest price and likes for one or two stocks
///
/// Examples:
/// - /api/stock-prices?stock=GOOG
/// - /api/stock-prices?stock=GOOG&like=true
/// - /api/stock-prices?stock=GOOG&stock=MSFT
/// - /api/stock-prices?stock=GOOG&stock=MSFT&like=true
#[instrument(skip_all)]
pub async fn get_stock_prices_handler(
    State(app_state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    query: std::result::Result<Query<StockPricesQuery>, QueryRejection>,
) -> Response {
    let mut metrics = RequestMetrics::new("/api/stock-prices");

    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!(error = %rejection, "Unparseable query string");
            let errors = vec![ValidationError::malformed(&rejection.to_string())];
            return validation_failure(&mut metrics, errors);
        }
    };

    debug!("Received request for stock prices with params: {:?}", params);

    let symbols = match validate_stocks(params.stock.as_deref()) {
        Ok(symbols) => symbols,
        Err(errors) => {
            warn!(?errors, "Invalid stock-prices request");
            return validation_failure(&mut metrics, errors);
        }
    };

    let like = parse_like(params.like.as_deref());
    let requester = like.then(|| requester_identity(&headers, peer, app_state.trust_proxy));

    metrics.symbol_count = symbols.len();
    metrics.like = like;

    match fetch_stock_prices(&app_state, &symbols, requester.as_deref()).await {
        Ok((response, quotes_missing)) => {
            metrics.quotes_missing = quotes_missing;
            metrics.complete(RequestStatus::Success);
            metrics.write_log_entry();

            debug!(symbols = ?symbols, like, quotes_missing, "Returning stock data");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(symbols = ?symbols, error = %e, "Failed to process stock-prices request");
            metrics.error_message = Some(e.to_string());
            metrics.complete(RequestStatus::Fail);
            metrics.write_log_entry();

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Internal server error"
                })),
            )
                .into_response()
        }
    }
}

fn validation_failure(metrics: &mut RequestMetrics, errors: Vec<ValidationError>) -> Response {
    metrics.error_message = errors.first().map(|e| e.msg.clone());
    metrics.complete(RequestStatus::Invalid);
    metrics.write_log_entry();

    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "errors": errors })),
    )
        .into_response()
}

/// Fetch, record and assemble. Symbols are handled in request order.
///
/// Returns the response body and how many quotes were unavailable.
async fn fetch_stock_prices(
    app_state: &AppState,
    symbols: &[String],
    requester: Option<&str>,
) -> Result<(StockPricesResponse, usize)> {
    let mut records = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        records.push(record_stock(app_state, symbol, requester).await?);
    }

    let quotes_missing = records.iter().filter(|r| r.price.is_none()).count();

    let mut records = records.into_iter();
    let response = match (records.next(), records.next()) {
        (Some(first), None) => StockPricesResponse::single(first),
        (Some(first), Some(second)) => StockPricesResponse::pair(first, second),
        _ => {
            return Err(AppError::InvalidInput(format!(
                "expected 1 to {} stock symbols, got {}",
                MAX_SYMBOLS,
                symbols.len()
            )))
        }
    };

    Ok((response, quotes_missing))
}

async fn record_stock(app_state: &AppState, symbol: &str, requester: Option<&str>) -> Result<StockRecord> {
    let price = app_state.quotes.fetch_latest_price(symbol).await;
    app_state.store.upsert_stock(symbol, price, requester).await
}

/// Check the `stock` values and normalize them to escaped uppercase symbols
pub fn validate_stocks(stocks: Option<&[String]>) -> std::result::Result<Vec<String>, Vec<ValidationError>> {
    let stocks = match stocks {
        Some(stocks) if !stocks.is_empty() => stocks,
        _ => return Err(vec![ValidationError::query("stock", "", "Invalid value")]),
    };

    let mut errors = Vec::new();

    if stocks.len() > MAX_SYMBOLS {
        errors.push(ValidationError::query(
            "stock",
            &stocks.join(","),
            &format!("At most {} stocks can be compared", MAX_SYMBOLS),
        ));
    }

    for stock in stocks {
        if stock.trim().is_empty() {
            errors.push(ValidationError::query("stock", stock, "Invalid value"));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(stocks.iter().map(|s| normalize_symbol(s)).collect())
}

/// Uppercase and HTML-escape a raw symbol
pub fn normalize_symbol(raw: &str) -> String {
    escape_html(&raw.trim().to_uppercase())
}

/// Escape the characters that are unsafe to echo back into HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A like is registered only for a single `like` value of "true" or "1"
pub fn parse_like(like: Option<&[String]>) -> bool {
    match like {
        Some([value]) => matches!(value.trim(), "true" | "1"),
        _ => false,
    }
}

/// Identity a like is recorded under: the peer address, or the first
/// X-Forwarded-For hop when the service sits behind a trusted proxy
pub fn requester_identity(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded.unwrap_or_else(|| peer.ip()).to_canonical().to_string()
}

/// GET /health - Health statistics endpoint
#[instrument(skip(app_state))]
pub async fn health_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    debug!("Received request for health stats");

    match app_state.store.stats().await {
        Ok(stats) => {
            let health_stats = HealthStats {
                status: "ok",
                uptime_secs: app_state.started_at.elapsed().as_secs(),
                stock_count: stats.stock_count,
                like_count: stats.like_count,
                current_system_time: Utc::now().to_rfc3339(),
            };

            // No per-request log line for /health (too noisy)
            (StatusCode::OK, Json(health_stats)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to read store statistics");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "error": "Store unavailable"
                })),
            )
                .into_response()
        }
    }
}
