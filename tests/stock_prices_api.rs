use axum::{extract::Path, response::IntoResponse, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stock_price_checker::server::{self, AppState};
use stock_price_checker::services::{QuoteClient, StockStore};
use tempfile::TempDir;

struct TestApp {
    addr: SocketAddr,
    client: reqwest::Client,
    store: Arc<StockStore>,
    _dir: TempDir,
}

impl TestApp {
    async fn get(&self, query: &str, forwarded_for: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("http://{}/api/stock-prices{}", self.addr, query))
            .header("x-forwarded-for", forwarded_for)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.text().await.unwrap();
        (status, serde_json::from_str(&body).unwrap())
    }
}

/// Upstream stand-in: GOOG and MSFT have prices, FAIL returns 500, anything else is unknown
async fn mock_quote(Path(symbol): Path<String>) -> axum::response::Response {
    match symbol.as_str() {
        "GOOG" => Json(json!({ "symbol": "GOOG", "latestPrice": 1234.56 })).into_response(),
        "MSFT" => Json(json!({ "symbol": "MSFT", "latestPrice": 321.5 })).into_response(),
        "FAIL" => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        _ => Json("Unknown symbol").into_response(),
    }
}

async fn spawn_app() -> TestApp {
    let upstream = Router::new().route("/v1/stock/{symbol}/quote", get(mock_quote));
    let upstream_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = upstream_listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(upstream_listener, upstream).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}", dir.path().join("stocks.db").display());
    let store = Arc::new(StockStore::connect(&db_url).await.unwrap());

    let quotes = QuoteClient::new(&format!("http://{}/v1/stock", upstream_addr), Duration::from_secs(5)).unwrap();
    let app = server::router(AppState::new(store.clone(), quotes, true));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        store,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_single_stock_without_like() {
    let app = spawn_app().await;

    let (status, body) = app.get("?stock=GOOG", "1.2.3.4").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "stockData": { "stock": "GOOG", "price": 1234.56, "likes": 0 } }));
}

#[tokio::test]
async fn test_like_is_counted_once_per_requester() {
    let app = spawn_app().await;

    let (_, first) = app.get("?stock=GOOG&like=true", "1.2.3.4").await;
    assert_eq!(first, json!({ "stockData": { "stock": "GOOG", "price": 1234.56, "likes": 1 } }));

    let (_, second) = app.get("?stock=GOOG&like=true", "1.2.3.4").await;
    assert_eq!(second["stockData"]["likes"], 1);

    let (_, other) = app.get("?stock=GOOG&like=1", "5.6.7.8").await;
    assert_eq!(other["stockData"]["likes"], 2);

    // Plain requests and non-true like values never change the count
    let (_, plain) = app.get("?stock=GOOG", "9.9.9.9").await;
    assert_eq!(plain["stockData"]["likes"], 2);
    let (_, falsy) = app.get("?stock=GOOG&like=false", "9.9.9.9").await;
    assert_eq!(falsy["stockData"]["likes"], 2);
}

#[tokio::test]
async fn test_repeated_like_is_not_a_like() {
    let app = spawn_app().await;

    let (status, body) = app.get("?stock=GOOG&like=true&like=true", "1.2.3.4").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "stockData": { "stock": "GOOG", "price": 1234.56, "likes": 0 } }));

    let (status, body) = app.get("?stock=GOOG&like=1&like=1", "5.6.7.8").await;
    assert_eq!(status, 200);
    assert_eq!(body["stockData"]["likes"], 0);
}

#[tokio::test]
async fn test_symbols_are_case_insensitive() {
    let app = spawn_app().await;

    app.get("?stock=goog&like=true", "1.2.3.4").await;
    let (_, body) = app.get("?stock=GOOG", "1.2.3.4").await;
    assert_eq!(body["stockData"]["stock"], "GOOG");
    assert_eq!(body["stockData"]["likes"], 1);

    let stored = app.store.list_stocks().await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_two_stocks_report_relative_likes() {
    let app = spawn_app().await;

    app.get("?stock=GOOG&like=true", "1.1.1.1").await;
    app.get("?stock=GOOG&like=true", "2.2.2.2").await;
    app.get("?stock=MSFT&like=true", "3.3.3.3").await;

    let (status, body) = app.get("?stock=GOOG&stock=MSFT", "4.4.4.4").await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "stockData": [
            { "stock": "GOOG", "price": 1234.56, "rel_likes": 1 },
            { "stock": "MSFT", "price": 321.5, "rel_likes": -1 }
        ] })
    );

    // A like on a pair request likes both stocks
    let (_, liked) = app.get("?stock=msft&stock=goog&like=true", "4.4.4.4").await;
    assert_eq!(liked["stockData"][0]["stock"], "MSFT");
    assert_eq!(liked["stockData"][0]["rel_likes"], -1);
    assert_eq!(liked["stockData"][1]["rel_likes"], 1);

    let goog = app.store.get_stock("GOOG").await.unwrap().unwrap();
    let msft = app.store.get_stock("MSFT").await.unwrap().unwrap();
    assert_eq!((goog.likes, msft.likes), (3, 2));
}

#[tokio::test]
async fn test_missing_stock_is_a_validation_error() {
    let app = spawn_app().await;

    let (status, body) = app.get("", "1.2.3.4").await;
    assert_eq!(status, 400);
    assert_eq!(body["errors"][0]["path"], "stock");
    assert_eq!(body["errors"][0]["location"], "query");

    let (status, _) = app.get("?stock=", "1.2.3.4").await;
    assert_eq!(status, 400);

    let (status, body) = app.get("?stock=A&stock=B&stock=C", "1.2.3.4").await;
    assert_eq!(status, 400);
    assert!(body["errors"].as_array().is_some_and(|errors| !errors.is_empty()));

    assert!(app.store.list_stocks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_still_records_like() {
    let app = spawn_app().await;

    let (status, body) = app.get("?stock=FAIL&like=true", "1.2.3.4").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "stockData": { "stock": "FAIL", "price": null, "likes": 1 } }));

    let (_, unknown) = app.get("?stock=NOPE", "1.2.3.4").await;
    assert_eq!(unknown["stockData"]["price"], Value::Null);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = spawn_app().await;
    app.store.close().await;

    let (status, body) = app.get("?stock=GOOG", "1.2.3.4").await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = spawn_app().await;
    app.get("?stock=GOOG&like=true", "1.2.3.4").await;

    let response = app
        .client
        .get(format!("http://{}/health", app.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response
        .headers()
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("script-src 'self'")));

    let body: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stock_count"], 1);
    assert_eq!(body["like_count"], 1);
}
