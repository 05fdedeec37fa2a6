use crate::config::QuoteApiConfig;
use crate::server::api::normalize_symbol;
use crate::services::QuoteClient;

/// Fetch one quote from the upstream API and print it
pub async fn run(symbol: String, config: QuoteApiConfig) {
    let symbol = normalize_symbol(&symbol);
    println!("🔍 Fetching quote for {} from {}", symbol, config.quote_api_base);

    let client = match QuoteClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    match client.try_fetch_quote(&symbol).await {
        Ok(quote) => match quote.latest_price {
            Some(price) => println!("✅ {}: {:.2}", quote.symbol.unwrap_or(symbol), price),
            None => println!("⚠️  {}: no latestPrice in response", symbol),
        },
        Err(e) => {
            eprintln!("❌ Quote fetch failed: {}", e);
            std::process::exit(1);
        }
    }
}
