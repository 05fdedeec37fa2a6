use chrono::{DateTime, Utc};
use tracing::info;

/// API request performance metrics
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: RequestStatus,
    pub endpoint: String,
    pub symbol_count: usize,
    pub like: bool,
    pub quotes_missing: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Invalid,
    Fail,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "OK",
            RequestStatus::Invalid => "INVALID",
            RequestStatus::Fail => "FAIL",
        }
    }
}

impl RequestMetrics {
    pub fn new(endpoint: &str) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            duration_ms: 0,
            status: RequestStatus::Success,
            endpoint: endpoint.to_string(),
            symbol_count: 0,
            like: false,
            quotes_missing: 0,
            error_message: None,
        }
    }

    /// Stop the clock and mark the outcome
    pub fn complete(&mut self, status: RequestStatus) {
        self.status = status;
        self.end_time = Utc::now();
        self.duration_ms = (self.end_time - self.start_time).num_milliseconds().max(0) as u64;
    }

    /// Compact one-line summary of the request
    pub fn log_line(&self) -> String {
        let duration_str = if self.duration_ms >= 1000 {
            format!("{}.{:01}s", self.duration_ms / 1000, (self.duration_ms % 1000) / 100)
        } else {
            format!("{}ms", self.duration_ms)
        };

        let error_info = if let Some(ref error) = self.error_message {
            format!(" error:{}", error)
        } else {
            String::new()
        };

        format!(
            "{} | {} | {} | {} | symbols:{} like:{} missing_quotes:{}{}",
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
            duration_str,
            self.endpoint,
            self.status.as_str(),
            self.symbol_count,
            self.like,
            self.quotes_missing,
            error_info
        )
    }

    pub fn write_log_entry(&self) {
        info!(target: "api_requests", "{}", self.log_line());
    }
}
