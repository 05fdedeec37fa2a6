use crate::config::StoreConfig;
use crate::error::AppError;
use crate::models::StockRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared handle used by the HTTP layer
pub type SharedStockStore = Arc<StockStore>;

/// Database schema version for migrations
const DB_SCHEMA_VERSION: &str = "1";

/// SQLite-backed store for stock prices and likes
///
/// Likes live in their own table with one row per (symbol, requester) pair;
/// the like count of a stock is always derived from that table.
#[derive(Debug)]
pub struct StockStore {
    pool: SqlitePool,
}

/// Store-wide counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub stock_count: i64,
    pub like_count: i64,
}

impl StockStore {
    /// Connect to the store and create the schema if needed
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        info!(database_url, "Connecting to stock store");

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Config(format!("Invalid database URL '{}': {}", database_url, e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal) // Enable concurrent reads/writes
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30)) // Wait 30s for locked DB
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connect_options)
            .await?;

        let store = Self { pool };
        store.initialize_database().await?;

        info!("Stock store initialized successfully");
        Ok(store)
    }

    pub async fn from_config(config: &StoreConfig) -> Result<Self, AppError> {
        Self::connect(&config.database_url).await
    }

    /// Initialize database schema
    async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stocks (
                symbol TEXT PRIMARY KEY,
                price REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_likes (
                symbol TEXT NOT NULL REFERENCES stocks(symbol),
                requester_ip TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (symbol, requester_ip)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)")
            .bind(DB_SCHEMA_VERSION)
            .execute(&self.pool)
            .await?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Record the latest price for a symbol and optionally register a like
    ///
    /// The stock row is created on first sight and its price overwritten on
    /// every call. When `liked_by` is set, the requester is added to the
    /// symbol's like set; a requester already in the set changes nothing.
    /// Both writes and the read-back run in one transaction, and each write
    /// is a single upsert statement, so concurrent calls never lose a like.
    pub async fn upsert_stock(
        &self,
        symbol: &str,
        price: Option<f64>,
        liked_by: Option<&str>,
    ) -> Result<StockRecord, AppError> {
        let mut transaction = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO stocks (symbol, price) VALUES (?1, ?2)
            ON CONFLICT(symbol) DO UPDATE SET
                price = excluded.price,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(symbol)
        .bind(price)
        .execute(&mut *transaction)
        .await?;

        if let Some(requester) = liked_by {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO stock_likes (symbol, requester_ip) VALUES (?1, ?2)",
            )
            .bind(symbol)
            .bind(requester)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

            debug!(symbol, new_like = inserted > 0, "Registered like");
        }

        let row = sqlx::query(
            r#"
            SELECT s.symbol, s.price,
                   (SELECT COUNT(*) FROM stock_likes l WHERE l.symbol = s.symbol) AS likes
            FROM stocks s
            WHERE s.symbol = ?1
            "#,
        )
        .bind(symbol)
        .fetch_one(&mut *transaction)
        .await?;

        let record = row_to_record(&row)?;
        transaction.commit().await?;

        Ok(record)
    }

    /// Current state of a stock, if it has ever been requested
    pub async fn get_stock(&self, symbol: &str) -> Result<Option<StockRecord>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT s.symbol, s.price,
                   (SELECT COUNT(*) FROM stock_likes l WHERE l.symbol = s.symbol) AS likes
            FROM stocks s
            WHERE s.symbol = ?1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// All stored stocks ordered by symbol
    pub async fn list_stocks(&self) -> Result<Vec<StockRecord>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT s.symbol, s.price, COUNT(l.requester_ip) AS likes
            FROM stocks s
            LEFT JOIN stock_likes l ON l.symbol = s.symbol
            GROUP BY s.symbol, s.price
            ORDER BY s.symbol
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    pub async fn stats(&self) -> Result<StoreStats, AppError> {
        let stock_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks")
            .fetch_one(&self.pool)
            .await?;

        let like_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_likes")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            stock_count,
            like_count,
        })
    }

    /// Close database connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Stock store connection pool closed");
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<StockRecord, AppError> {
    Ok(StockRecord {
        symbol: row.try_get("symbol")?,
        price: row.try_get("price")?,
        likes: row.try_get("likes")?,
    })
}
