// src/domain/service/snapshot.rs
// Reconciles per-exchange quote snapshots into one ranked view

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::symbol::{base_symbol_of, fetch_symbol_of};
use crate::domain::models::{Exchange, ExchangeSnapshot, MarketSnapshot, Quote};

/// Number of gainers and losers kept in a combined snapshot.
pub const MOMENTUM_LIMIT: usize = 5;

/// De-duplicates on the fetch symbol. Later entries overwrite earlier ones but
/// keep the slot of the first occurrence.
pub fn merge_by_key(quotes: &[Quote]) -> Vec<Quote> {
    let mut merged: IndexMap<String, Quote> = IndexMap::with_capacity(quotes.len());
    for quote in quotes {
        merged.insert(fetch_symbol_of(quote), quote.clone());
    }
    merged.into_values().collect()
}

/// Collapses listings of the same company, keeping the bigger mover.
/// Equal moves resolve to the later entry in input order.
pub fn merge_by_company(quotes: &[Quote]) -> Vec<Quote> {
    let mut merged: IndexMap<String, Quote> = IndexMap::with_capacity(quotes.len());
    for quote in quotes {
        let key = base_symbol_of(quote);
        match merged.get_mut(&key) {
            Some(existing) => {
                if magnitude(quote) >= magnitude(existing) {
                    *existing = quote.clone();
                }
            }
            None => {
                merged.insert(key, quote.clone());
            }
        }
    }
    merged.into_values().collect()
}

pub fn combine_snapshots(
    primary: Option<&ExchangeSnapshot>,
    secondary: Option<&ExchangeSnapshot>,
    now: DateTime<Utc>,
) -> MarketSnapshot {
    let mut market_stats_by_exchange = BTreeMap::new();
    for (exchange, snapshot) in [(Exchange::Primary, primary), (Exchange::Secondary, secondary)] {
        if let Some(stats) = snapshot.and_then(|s| s.stats) {
            market_stats_by_exchange.insert(exchange, stats);
        }
    }

    let sources: Vec<&ExchangeSnapshot> = [primary, secondary].into_iter().flatten().collect();

    let all_indices: Vec<Quote> = sources
        .iter()
        .flat_map(|s| s.indices.iter().cloned())
        .collect();
    let indices = merge_by_key(&all_indices);

    let candidates: Vec<Quote> = sources
        .iter()
        .flat_map(|s| s.gainers.iter().chain(s.losers.iter()).cloned())
        .collect();
    let universe = merge_by_company(&candidates);

    let (mut gainers, mut losers): (Vec<Quote>, Vec<Quote>) = universe
        .into_iter()
        .filter(|q| !q.percent_change.is_nan())
        .partition(|q| q.percent_change >= 0.0);

    gainers.sort_by(|a, b| compare_change(b, a));
    gainers.truncate(MOMENTUM_LIMIT);
    losers.sort_by(compare_change);
    losers.truncate(MOMENTUM_LIMIT);

    let timestamp = primary
        .and_then(|s| s.timestamp)
        .or_else(|| secondary.and_then(|s| s.timestamp))
        .unwrap_or(now);

    MarketSnapshot {
        indices,
        gainers,
        losers,
        market_stats_by_exchange,
        timestamp,
    }
}

fn magnitude(quote: &Quote) -> f64 {
    let m = quote.percent_change.abs();
    if m.is_nan() {
        0.0
    } else {
        m
    }
}

fn compare_change(a: &Quote, b: &Quote) -> Ordering {
    a.percent_change
        .partial_cmp(&b.percent_change)
        .unwrap_or(Ordering::Equal)
}
