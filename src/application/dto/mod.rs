// src/application/dto/mod.rs
// Wire formats returned by the market data provider

pub mod parser;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::errors::MarketDataError;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl From<ApplicationError> for MarketDataError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::ApiError(msg) => MarketDataError::Api(msg),
            other => MarketDataError::InvalidFormat(other.to_string()),
        }
    }
}

/// `{success, data}` or `{success: false, error}`
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Result<T, ApplicationError> {
        if !self.success {
            return Err(ApplicationError::ApiError(
                self.error.unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApplicationError::ParseError("missing data field".to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub yahoo_symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub results: Vec<QuoteDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryData {
    #[serde(default)]
    pub prices: Vec<HistoryPointDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryPointDto {
    #[serde(default, alias = "time", alias = "label")]
    pub date: String,
    #[serde(default, alias = "close")]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatsDto {
    #[serde(default)]
    pub today_high: Option<f64>,
    #[serde(default)]
    pub today_low: Option<f64>,
    #[serde(default)]
    pub advances: Option<u32>,
    #[serde(default)]
    pub declines: Option<u32>,
    #[serde(default)]
    pub unchanged: Option<u32>,
}

/// Epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampDto {
    Millis(i64),
    Text(String),
}

/// Per-exchange response of the indices endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSnapshotDto {
    #[serde(default)]
    pub indices: Vec<QuoteDto>,
    #[serde(default)]
    pub gainers: Vec<QuoteDto>,
    #[serde(default)]
    pub losers: Vec<QuoteDto>,
    #[serde(default, alias = "marketStats")]
    pub stats: Option<MarketStatsDto>,
    #[serde(default)]
    pub timestamp: Option<TimestampDto>,
}

/// Payload of a `snapshot` stream event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshotDto {
    #[serde(default)]
    pub indices: Vec<QuoteDto>,
    #[serde(default)]
    pub gainers: Vec<QuoteDto>,
    #[serde(default)]
    pub losers: Vec<QuoteDto>,
    /// Keyed by exchange wire name
    #[serde(default)]
    pub market_stats: HashMap<String, MarketStatsDto>,
    #[serde(default)]
    pub timestamp: Option<TimestampDto>,
}
