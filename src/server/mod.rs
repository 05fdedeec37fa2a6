pub mod api;

use crate::error::AppError;
use crate::services::{QuoteClient, SharedStockStore};
use axum::{
    http::{header::CONTENT_SECURITY_POLICY, HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// Only same-origin scripts and styles may be loaded by pages served alongside the API
const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; script-src 'self'; style-src 'self'";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStockStore,
    pub quotes: QuoteClient,
    pub trust_proxy: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: SharedStockStore, quotes: QuoteClient, trust_proxy: bool) -> Self {
        Self {
            store,
            quotes,
            trust_proxy,
            started_at: Instant::now(),
        }
    }
}

/// Build the router with all routes and layers
pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    let csp = SetResponseHeaderLayer::if_not_present(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
    );

    Router::new()
        .route("/api/stock-prices", get(api::get_stock_prices_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .layer(csp)
        .with_state(app_state)
}

/// Start the axum server and run until Ctrl-C
pub async fn serve(app_state: AppState, port: u16) -> Result<(), AppError> {
    tracing::info!("Registering routes:");
    tracing::info!("  GET /api/stock-prices?stock=GOOG[&stock=MSFT][&like=true]");
    tracing::info!("  GET /health");

    let app = router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped accepting connections");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler we never shut down on our own
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
