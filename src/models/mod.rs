mod stock;

pub use stock::{RelativeStockData, StockData, StockPricesResponse, StockQuote, StockRecord};
