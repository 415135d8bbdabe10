// src/domain/service/search.rs
// Zero-latency ranking over quotes that are already on screen

use super::snapshot::merge_by_company;
use super::symbol::{base_symbol_of, fetch_symbol_of};
use crate::domain::models::Quote;

pub const MIN_QUERY_LEN: usize = 2;
pub const RESULT_LIMIT: usize = 8;

const EXACT_MATCH: u32 = 1000;
const BASE_PREFIX: u32 = 360;
const BASE_CONTAINS: u32 = 200;
const QUALIFIED_PREFIX: u32 = 220;
const QUALIFIED_CONTAINS: u32 = 120;
const NAME_PREFIX: u32 = 150;
const NAME_CONTAINS: u32 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuote {
    pub quote: Quote,
    pub score: u32,
}

/// Trimmed, upper-cased form every score comparison runs against.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_uppercase()
}

/// Relevance of `quote` for an already normalized query. Zero means no match.
pub fn score(quote: &Quote, normalized_query: &str) -> u32 {
    if normalized_query.is_empty() {
        return 0;
    }

    let base = base_symbol_of(quote);
    let qualified = fetch_symbol_of(quote);
    if base == normalized_query || qualified == normalized_query {
        return EXACT_MATCH;
    }

    let name = quote.display_name.trim().to_uppercase();
    tiered(&base, normalized_query, BASE_PREFIX, BASE_CONTAINS)
        + tiered(&qualified, normalized_query, QUALIFIED_PREFIX, QUALIFIED_CONTAINS)
        + tiered(&name, normalized_query, NAME_PREFIX, NAME_CONTAINS)
}

/// Best matches from `pool`, one entry per company, highest score first.
pub fn rank(pool: &[Quote], query: &str) -> Vec<ScoredQuote> {
    let normalized = normalize_query(query);
    if normalized.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }

    let mut scored: Vec<ScoredQuote> = merge_by_company(pool)
        .into_iter()
        .filter_map(|quote| {
            let score = score(&quote, &normalized);
            (score > 0).then_some(ScoredQuote { quote, score })
        })
        .collect();

    // stable: equal scores keep de-duplication order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(RESULT_LIMIT);
    scored
}

fn tiered(field: &str, query: &str, prefix: u32, contains: u32) -> u32 {
    if field.is_empty() {
        0
    } else if field.starts_with(query) {
        prefix
    } else if field.contains(query) {
        contains
    } else {
        0
    }
}
