use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::{QuoteApiConfig, ServiceConfig, StoreConfig};

#[derive(Parser)]
#[command(name = "stock-price-checker")]
#[command(about = "Stock price checker API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Serve {
        #[command(flatten)]
        config: ServiceConfig,
    },
    /// Show stored stocks with prices and like counts
    Status {
        #[command(flatten)]
        store: StoreConfig,
    },
    /// Fetch a single quote from the upstream API
    Quote {
        /// Ticker symbol, e.g. GOOG
        symbol: String,

        #[command(flatten)]
        quote_api: QuoteApiConfig,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            commands::serve::run(config).await;
        }
        Commands::Status { store } => {
            commands::status::run(store).await;
        }
        Commands::Quote { symbol, quote_api } => {
            commands::quote::run(symbol, quote_api).await;
        }
    }
}
