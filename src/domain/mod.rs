// src/domain/mod.rs
pub mod errors;
pub mod models;
pub mod repository;
pub mod service;

// Re-export common types for convenience
pub use errors::{AppError, AppResult, MarketDataError, MarketDataResult};
pub use models::{
    DragSelection, Exchange, ExchangeSnapshot, HistoryPeriod, HistoryPoint, MarketSnapshot,
    MarketStats, Quote, SymbolKind,
};
