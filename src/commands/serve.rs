use crate::config::ServiceConfig;
use crate::error::Result;
use crate::server::{self, AppState};
use crate::services::{QuoteClient, StockStore};
use std::sync::Arc;

pub async fn run(config: ServiceConfig) {
    println!("🚀 Starting stock price checker on port {}", config.port);

    if let Err(e) = serve(config).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}

async fn serve(config: ServiceConfig) -> Result<()> {
    // Store is connected before the listener binds and closed after it drains
    println!("🗄️  Connecting to store: {}", config.store.database_url);
    let store = Arc::new(StockStore::from_config(&config.store).await?);

    let quotes = QuoteClient::from_config(&config.quote_api)?;
    println!(
        "🌐 Quote API: {} (timeout {}s)",
        config.quote_api.quote_api_base, config.quote_api.quote_timeout_secs
    );

    if config.trust_proxy {
        println!("   ℹ️  Requester identity taken from X-Forwarded-For");
    }

    let app_state = AppState::new(store.clone(), quotes, config.trust_proxy);
    let result = server::serve(app_state, config.port).await;

    store.close().await;
    result
}
