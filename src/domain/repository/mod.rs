// src/domain/repository/mod.rs
// Repository interface for the market data provider

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::MarketDataResult;
use crate::domain::models::{Exchange, ExchangeSnapshot, HistoryPeriod, HistoryPoint, MarketSnapshot, Quote};

#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    /// Latest quote for a symbol on the given exchange
    async fn get_quote(&self, symbol: &str, exchange: Exchange) -> MarketDataResult<Quote>;

    /// Remote symbol search. Queries shorter than two characters yield nothing.
    async fn search(&self, query: &str, exchange: Exchange) -> MarketDataResult<Vec<Quote>>;

    /// Price history for the chart
    async fn get_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        exchange: Exchange,
    ) -> MarketDataResult<Vec<HistoryPoint>>;

    /// One-shot indices/gainers/losers for a single exchange
    async fn get_exchange_snapshot(&self, exchange: Exchange) -> MarketDataResult<ExchangeSnapshot>;

    /// Live combined snapshots. The receiver closes when the stream ends.
    async fn subscribe_snapshots(&self) -> MarketDataResult<mpsc::Receiver<MarketSnapshot>>;
}
