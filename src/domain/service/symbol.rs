// src/domain/service/symbol.rs
// Ticker canonicalization: base vs exchange-qualified symbols

use crate::domain::models::{Exchange, Quote, SymbolKind};

const INDEX_MARKER: char = '^';
const RATE_PAIR_MARKER: char = '=';

/// Symbol used when asking the provider for this quote.
pub fn fetch_symbol_of(quote: &Quote) -> String {
    quote
        .exchange_qualified_symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| quote.symbol.trim())
        .to_uppercase()
}

pub fn classify(quote: &Quote) -> SymbolKind {
    classify_symbol(&fetch_symbol_of(quote))
}

pub fn classify_symbol(symbol: &str) -> SymbolKind {
    let upper = symbol.trim().to_uppercase();
    if upper.starts_with(INDEX_MARKER) {
        return SymbolKind::Index;
    }
    if upper.contains(RATE_PAIR_MARKER) {
        return SymbolKind::SyntheticRate;
    }
    match split_suffix(&upper) {
        Some((_, exchange)) => SymbolKind::Equity {
            exchange,
            qualified: true,
        },
        None => SymbolKind::Equity {
            exchange: Exchange::Primary,
            qualified: false,
        },
    }
}

pub fn exchange_of(quote: &Quote) -> Exchange {
    classify(quote).exchange()
}

pub fn is_toggleable(quote: &Quote) -> bool {
    classify(quote).is_toggleable()
}

/// Company key shared by the Primary and Secondary listings.
pub fn base_symbol_of(quote: &Quote) -> String {
    let fetch_symbol = fetch_symbol_of(quote);
    if classify_symbol(&fetch_symbol).is_toggleable() {
        if let Some((base, _)) = split_suffix(&fetch_symbol) {
            return base.to_string();
        }
    }

    let bare = quote.symbol.trim().to_uppercase();
    if bare.is_empty() {
        fetch_symbol
    } else {
        bare
    }
}

/// Qualified symbol for `exchange`. Index and rate symbols are returned as-is.
pub fn with_exchange(quote: &Quote, exchange: Exchange) -> String {
    let fetch_symbol = fetch_symbol_of(quote);
    match classify_symbol(&fetch_symbol) {
        SymbolKind::Index | SymbolKind::SyntheticRate => fetch_symbol,
        SymbolKind::Equity { .. } => {
            let base = base_symbol_of(quote);
            if base.is_empty() {
                fetch_symbol
            } else {
                format!("{}{}", base, exchange.suffix())
            }
        }
    }
}

/// Copy of `quote` re-qualified for `exchange`.
pub fn requalify(quote: &Quote, exchange: Exchange) -> Quote {
    let mut moved = quote.clone();
    if let SymbolKind::Equity { .. } = classify(quote) {
        let qualified = with_exchange(quote, exchange);
        if !qualified.is_empty() {
            moved.exchange_qualified_symbol = Some(qualified);
        }
    }
    moved
}

fn split_suffix(upper: &str) -> Option<(&str, Exchange)> {
    Exchange::ALL.iter().find_map(|exchange| {
        upper
            .strip_suffix(exchange.suffix())
            .filter(|base| !base.is_empty())
            .map(|base| (base, *exchange))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, qualified: Option<&str>) -> Quote {
        let q = Quote::new(symbol, symbol, 100.0);
        match qualified {
            Some(qs) => q.with_qualified_symbol(qs),
            None => q,
        }
    }

    #[test]
    fn fetch_symbol_prefers_qualified() {
        assert_eq!(fetch_symbol_of(&quote("tcs", Some("tcs.ns"))), "TCS.NS");
        assert_eq!(fetch_symbol_of(&quote("infy", None)), "INFY");
        assert_eq!(fetch_symbol_of(&quote("infy", Some("  "))), "INFY");
    }

    #[test]
    fn exchange_follows_suffix() {
        assert_eq!(exchange_of(&quote("TCS", Some("TCS.BO"))), Exchange::Secondary);
        assert_eq!(exchange_of(&quote("TCS", Some("TCS.NS"))), Exchange::Primary);
        assert_eq!(exchange_of(&quote("TCS", None)), Exchange::Primary);
    }

    #[test]
    fn special_tickers_are_primary_and_not_toggleable() {
        let index = quote("NIFTY 50", Some("^NSEI"));
        let rate = quote("USDINR", Some("USDINR=X"));
        let bare = quote("TCS", None);

        assert_eq!(classify(&index), SymbolKind::Index);
        assert_eq!(classify(&rate), SymbolKind::SyntheticRate);
        for q in [&index, &rate, &bare] {
            assert_eq!(exchange_of(q), Exchange::Primary);
            assert!(!is_toggleable(q));
        }
    }

    #[test]
    fn base_symbol_strips_suffix() {
        assert_eq!(base_symbol_of(&quote("TCS", Some("TCS.NS"))), "TCS");
        assert_eq!(base_symbol_of(&quote("tcs", Some("tcs.bo"))), "TCS");
        assert_eq!(base_symbol_of(&quote("reliance", None)), "RELIANCE");
        assert_eq!(base_symbol_of(&quote("NIFTY 50", Some("^NSEI"))), "NIFTY 50");
    }

    #[test]
    fn with_exchange_round_trips() {
        for original in [quote("TCS", Some("TCS.NS")), quote("TCS", Some("TCS.BO"))] {
            for target in Exchange::ALL {
                let moved = requalify(&original, target);
                assert_eq!(exchange_of(&moved), target);
                assert_eq!(base_symbol_of(&moved), "TCS");
            }
        }
    }

    #[test]
    fn with_exchange_appends_for_bare_equity() {
        assert_eq!(with_exchange(&quote("INFY", None), Exchange::Secondary), "INFY.BO");
    }

    #[test]
    fn with_exchange_ignores_index_and_rates() {
        assert_eq!(with_exchange(&quote("NIFTY", Some("^NSEI")), Exchange::Secondary), "^NSEI");
        assert_eq!(
            with_exchange(&quote("USDINR", Some("USDINR=X")), Exchange::Secondary),
            "USDINR=X"
        );
    }

    #[test]
    fn malformed_input_degrades() {
        let empty = quote("", None);
        assert_eq!(fetch_symbol_of(&empty), "");
        assert_eq!(exchange_of(&empty), Exchange::Primary);
        assert_eq!(base_symbol_of(&empty), "");
        assert_eq!(with_exchange(&empty, Exchange::Secondary), "");

        let only_suffix = quote("", Some(".NS"));
        assert_eq!(exchange_of(&only_suffix), Exchange::Primary);
        assert_eq!(base_symbol_of(&only_suffix), ".NS");
    }
}
