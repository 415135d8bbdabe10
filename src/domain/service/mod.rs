// src/domain/service/mod.rs
// Pure market data services: symbol normalization, snapshot reconciliation, instant search

pub mod search;
pub mod snapshot;
pub mod symbol;

pub use search::{rank, score, ScoredQuote};
pub use snapshot::{combine_snapshots, merge_by_company, merge_by_key};
pub use symbol::{base_symbol_of, exchange_of, fetch_symbol_of, with_exchange};
