use thiserror::Error as ThisError;

/// Failures surfaced by the store, the quote client and the HTTP layer
///
/// Quote failures are only ever logged by the request path (a missing quote
/// means an unknown price); the `quote` command reports them to the user.
#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Transport-level failure talking to the quote provider
    #[error("Network error: {0}")]
    Network(String),

    #[error("Quote request for {symbol} timed out")]
    QuoteTimeout { symbol: String },

    /// Quote provider answered with a non-2xx status
    #[error("Quote API returned status {status} for {symbol}: {body}")]
    QuoteStatus { symbol: String, status: u16, body: String },

    /// Quote body was not the expected JSON object (e.g. "Unknown symbol")
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Connection loss, lock timeout or constraint failure in the stock store
    #[error("Database error: {0}")]
    Database(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// Alias for convenience
pub type Error = AppError;
