use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::StockRecord;
use crate::services::StockStore;

pub async fn run(config: StoreConfig) {
    println!("📊 Stock Store Status\n");

    if let Err(e) = show_status(&config).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn show_status(config: &StoreConfig) -> Result<()> {
    let store = StockStore::from_config(config).await?;
    let stats = store.stats().await?;
    let stocks = store.list_stocks().await?;
    store.close().await;

    if stocks.is_empty() {
        println!("⚠️  No stocks recorded yet.");
        return Ok(());
    }

    println!("📈 Stocks: {}   👍 Likes: {}\n", stats.stock_count, stats.like_count);
    println!("═══════════════════════════════════════════════════════════");
    for stock in &stocks {
        println!("{}", format_row(stock));
    }
    println!("═══════════════════════════════════════════════════════════");

    Ok(())
}

fn format_row(stock: &StockRecord) -> String {
    format!("🔹 {:<10} {:>12}  {:>6} likes", stock.symbol, format_price(stock.price), stock.likes)
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("{:.2}", price),
        None => "n/a".to_string(),
    }
}
