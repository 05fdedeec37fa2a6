pub mod quote_client;
pub mod request_metrics;
pub mod stock_store;

pub use quote_client::QuoteClient;
pub use request_metrics::{RequestMetrics, RequestStatus};
pub use stock_store::{SharedStockStore, StockStore, StoreStats};
