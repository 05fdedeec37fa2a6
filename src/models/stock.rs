use serde::{Deserialize, Serialize};

/// Quote body returned by the upstream proxy
///
/// Only `latestPrice` is required by the service; the proxy returns a bare
/// string such as `"Unknown symbol"` for tickers it does not know, which
/// fails to deserialize into this type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    #[serde(default)]
    pub symbol: Option<String>,

    #[serde(default)]
    pub latest_price: Option<f64>,
}

/// Persisted state of a single stock
///
/// `likes` is the number of distinct requesters that liked the symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    pub symbol: String,
    pub price: Option<f64>,
    pub likes: i64,
}

/// Single-symbol response item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockData {
    pub stock: String,
    /// Serialized as `null` when the upstream quote was unavailable
    pub price: Option<f64>,
    pub likes: i64,
}

/// Two-symbol response item, carrying likes relative to the other symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeStockData {
    pub stock: String,
    pub price: Option<f64>,
    pub rel_likes: i64,
}

/// Body of `GET /api/stock-prices`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StockPricesResponse {
    Single {
        #[serde(rename = "stockData")]
        stock_data: StockData,
    },
    Pair {
        #[serde(rename = "stockData")]
        stock_data: [RelativeStockData; 2],
    },
}

impl From<StockRecord> for StockData {
    fn from(record: StockRecord) -> Self {
        Self {
            stock: record.symbol,
            price: record.price,
            likes: record.likes,
        }
    }
}

impl StockPricesResponse {
    pub fn single(record: StockRecord) -> Self {
        StockPricesResponse::Single {
            stock_data: record.into(),
        }
    }

    /// Compare two stocks: the first gets `likes_a - likes_b`, the second its negation
    pub fn pair(first: StockRecord, second: StockRecord) -> Self {
        let diff = first.likes - second.likes;

        StockPricesResponse::Pair {
            stock_data: [
                RelativeStockData {
                    stock: first.symbol,
                    price: first.price,
                    rel_likes: diff,
                },
                RelativeStockData {
                    stock: second.symbol,
                    price: second.price,
                    rel_likes: -diff,
                },
            ],
        }
    }
}
