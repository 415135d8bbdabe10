// src/domain/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dashboard channel closed: {0}")]
    Channel(String),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Config(s)
    }
}

/// Failures talking to the market data provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Provider rejected request: {0}")]
    Api(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Snapshot stream error: {0}")]
    Stream(String),
}

impl MarketDataError {
    /// Transient failures are recovered locally and never surfaced as fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            MarketDataError::Network(_)
            | MarketDataError::Status(_)
            | MarketDataError::Timeout(_)
            | MarketDataError::InvalidFormat(_)
            | MarketDataError::Stream(_) => true,
            MarketDataError::Api(_) => false,
        }
    }
}

impl From<hyper::Error> for MarketDataError {
    fn from(err: hyper::Error) -> Self {
        MarketDataError::Network(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
pub type MarketDataResult<T> = Result<T, MarketDataError>;
