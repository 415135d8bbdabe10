// src/domain/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Trading venue a quote is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    #[serde(rename = "NSE")]
    Primary,
    #[serde(rename = "BSE")]
    Secondary,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Primary, Exchange::Secondary];

    /// Wire name used by the provider API.
    pub fn code(&self) -> &'static str {
        match self {
            Exchange::Primary => "NSE",
            Exchange::Secondary => "BSE",
        }
    }

    /// Suffix appended to a base symbol to qualify it for this exchange.
    pub fn suffix(&self) -> &'static str {
        match self {
            Exchange::Primary => ".NS",
            Exchange::Secondary => ".BO",
        }
    }

    pub fn other(&self) -> Exchange {
        match self {
            Exchange::Primary => Exchange::Secondary,
            Exchange::Secondary => Exchange::Primary,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NSE" | "PRIMARY" => Ok(Exchange::Primary),
            "BSE" | "SECONDARY" => Ok(Exchange::Secondary),
            other => Err(format!("Unknown exchange: {}", other)),
        }
    }
}

/// Classification of a ticker, derived once by the symbol normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A listed company. `qualified` is false when the ticker carried no
    /// recognizable exchange suffix.
    Equity { exchange: Exchange, qualified: bool },
    /// Market index such as `^NSEI`.
    Index,
    /// Currency pair or other synthetic rate such as `USDINR=X`.
    SyntheticRate,
}

impl SymbolKind {
    pub fn exchange(&self) -> Exchange {
        match self {
            SymbolKind::Equity { exchange, .. } => *exchange,
            SymbolKind::Index | SymbolKind::SyntheticRate => Exchange::Primary,
        }
    }

    /// Only suffixed equities can be flipped between exchanges.
    pub fn is_toggleable(&self) -> bool {
        matches!(self, SymbolKind::Equity { qualified: true, .. })
    }
}

/// Point-in-time price record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quote {
    pub symbol: String,
    pub exchange_qualified_symbol: Option<String>,
    pub display_name: String,
    pub price: f64,
    pub absolute_change: f64,
    pub percent_change: f64,
    pub currency_code: String,
}

impl Quote {
    pub fn new(symbol: &str, display_name: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            exchange_qualified_symbol: None,
            display_name: display_name.to_string(),
            price,
            absolute_change: 0.0,
            percent_change: 0.0,
            currency_code: "INR".to_string(),
        }
    }

    pub fn with_qualified_symbol(mut self, qualified: &str) -> Self {
        self.exchange_qualified_symbol = Some(qualified.to_string());
        self
    }

    pub fn with_change(mut self, absolute: f64, percent: f64) -> Self {
        self.absolute_change = absolute;
        self.percent_change = percent;
        self
    }

    /// `price >= 0` and both change figures point the same way.
    pub fn is_consistent(&self) -> bool {
        if !self.price.is_finite() || self.price < 0.0 {
            return false;
        }
        if self.absolute_change != 0.0 && self.percent_change != 0.0 {
            return self.absolute_change.signum() == self.percent_change.signum();
        }
        true
    }
}

/// Per-exchange breadth figures.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarketStats {
    pub today_high: f64,
    pub today_low: f64,
    pub advances: u32,
    pub declines: u32,
    pub unchanged: u32,
}

/// Quotes as reported by a single exchange, before reconciliation.
#[derive(Debug, Clone, Default)]
pub struct ExchangeSnapshot {
    pub indices: Vec<Quote>,
    pub gainers: Vec<Quote>,
    pub losers: Vec<Quote>,
    pub stats: Option<MarketStats>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// De-duplicated view across both exchanges. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub indices: Vec<Quote>,
    pub gainers: Vec<Quote>,
    pub losers: Vec<Quote>,
    pub market_stats_by_exchange: BTreeMap<Exchange, MarketStats>,
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            indices: Vec::new(),
            gainers: Vec::new(),
            losers: Vec::new(),
            market_stats_by_exchange: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.gainers.is_empty() && self.losers.is_empty()
    }
}

/// Chart range requested from the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1d")]
    Intraday,
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
}

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 5] = [
        HistoryPeriod::Intraday,
        HistoryPeriod::OneMonth,
        HistoryPeriod::ThreeMonths,
        HistoryPeriod::OneYear,
        HistoryPeriod::ThreeYears,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::Intraday => "1d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::ThreeYears => "3y",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HistoryPeriod::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown history period: {}", s))
    }
}

/// One chart sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryPoint {
    pub label: String,
    pub price: f64,
    pub volume: f64,
}

impl HistoryPoint {
    pub fn new(label: &str, price: f64, volume: f64) -> Self {
        Self {
            label: label.to_string(),
            price,
            volume,
        }
    }
}

/// Two-point comparison drawn on the price chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSelection {
    pub start_index: usize,
    pub end_index: usize,
    pub start_label: String,
    pub end_label: String,
    pub start_price: f64,
    pub end_price: f64,
    pub delta: f64,
    pub delta_percent: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl DragSelection {
    pub fn is_gain(&self) -> bool {
        self.delta >= 0.0
    }

    /// `+3.00 (+2.94%)`
    pub fn summary_line(&self) -> String {
        format!(
            "{}{:.2} ({}{:.2}%)",
            sign_of(self.delta),
            self.delta.abs(),
            sign_of(self.delta_percent),
            self.delta_percent.abs()
        )
    }

    pub fn range_line(&self) -> String {
        format!("{} - {}", self.start_label, self.end_label)
    }
}

fn sign_of(value: f64) -> &'static str {
    if value >= 0.0 {
        "+"
    } else {
        "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_codes_parse_both_ways() {
        for exchange in Exchange::ALL {
            assert_eq!(exchange.code().parse::<Exchange>(), Ok(exchange));
        }
        assert!("NYSE".parse::<Exchange>().is_err());
        assert_eq!(Exchange::Primary.other(), Exchange::Secondary);
    }

    #[test]
    fn history_period_parses_wire_names() {
        assert_eq!("3MO".parse::<HistoryPeriod>(), Ok(HistoryPeriod::ThreeMonths));
        assert_eq!(HistoryPeriod::default(), HistoryPeriod::OneMonth);
        assert!("5y".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn quote_consistency_checks_price_and_signs() {
        assert!(Quote::new("TCS", "TCS", 10.0).with_change(1.0, 2.0).is_consistent());
        assert!(!Quote::new("TCS", "TCS", -1.0).is_consistent());
        assert!(!Quote::new("TCS", "TCS", 10.0).with_change(-1.0, 2.0).is_consistent());
        assert!(!Quote::new("TCS", "TCS", f64::NAN).is_consistent());
    }

    #[test]
    fn selection_text_lines() {
        let selection = DragSelection {
            start_index: 0,
            end_index: 2,
            start_label: "01 Jan".into(),
            end_label: "03 Jan".into(),
            start_price: 200.0,
            end_price: 190.0,
            delta: -10.0,
            delta_percent: -5.0,
            start_x: 0.0,
            start_y: 0.0,
            end_x: 0.0,
            end_y: 0.0,
        };
        assert!(!selection.is_gain());
        assert_eq!(selection.summary_line(), "-10.00 (-5.00%)");
        assert_eq!(selection.range_line(), "01 Jan - 03 Jan");
    }
}
