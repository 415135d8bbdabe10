// src/application/usecase/mod.rs
pub mod chart_usecase;
pub mod search_usecase;
pub mod snapshot_usecase;

// Re-export public API
pub use chart_usecase::{ChartRequests, ChartUseCase, HistoryRequest, QuoteRequest};
pub use search_usecase::{RemoteSearch, SearchStatus, SearchUseCase, SearchView};
pub use snapshot_usecase::SnapshotUseCase;
