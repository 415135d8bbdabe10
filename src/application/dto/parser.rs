// src/application/dto/parser.rs
// Parsers from provider payloads into domain models

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;

use super::{
    ApiEnvelope, ApplicationError, ExchangeSnapshotDto, HistoryData, HistoryPointDto,
    MarketSnapshotDto, MarketStatsDto, QuoteDto, SearchData, TimestampDto,
};
use crate::domain::models::{
    Exchange, ExchangeSnapshot, HistoryPoint, MarketSnapshot, MarketStats, Quote,
};
use crate::domain::service::snapshot::combine_snapshots;

/// Decode a `{success, data}` envelope and unwrap its data.
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApplicationError> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    envelope.into_data()
}

pub fn parse_quote_response(body: &str) -> Result<Quote, ApplicationError> {
    let dto: QuoteDto = parse_envelope(body)?;
    let symbol = dto.symbol.clone();
    quote_from_dto(dto)
        .ok_or_else(|| ApplicationError::ParseError(format!("Invalid quote for {}", symbol)))
}

pub fn parse_search_response(body: &str) -> Result<Vec<Quote>, ApplicationError> {
    let data: SearchData = parse_envelope(body)?;
    Ok(quotes_from_dtos(data.results))
}

pub fn parse_history_response(body: &str) -> Result<Vec<HistoryPoint>, ApplicationError> {
    let data: HistoryData = parse_envelope(body)?;
    Ok(data.prices.into_iter().filter_map(history_point_from_dto).collect())
}

pub fn parse_exchange_snapshot_response(body: &str) -> Result<ExchangeSnapshot, ApplicationError> {
    let dto: ExchangeSnapshotDto = parse_envelope(body)?;
    Ok(ExchangeSnapshot {
        indices: quotes_from_dtos(dto.indices),
        gainers: quotes_from_dtos(dto.gainers),
        losers: quotes_from_dtos(dto.losers),
        stats: dto.stats.map(stats_from_dto),
        timestamp: dto.timestamp.and_then(timestamp_from_dto),
    })
}

/// Decode a streamed snapshot. The payload is re-ranked so the gainers and
/// losers invariants hold whatever the server sent.
pub fn parse_snapshot_event(data: &str, now: DateTime<Utc>) -> Result<MarketSnapshot, ApplicationError> {
    let dto: MarketSnapshotDto = serde_json::from_str(data)?;

    let source = ExchangeSnapshot {
        indices: quotes_from_dtos(dto.indices),
        gainers: quotes_from_dtos(dto.gainers),
        losers: quotes_from_dtos(dto.losers),
        stats: None,
        timestamp: dto.timestamp.and_then(timestamp_from_dto),
    };
    let mut snapshot = combine_snapshots(Some(&source), None, now);

    for (code, stats) in dto.market_stats {
        match code.parse::<Exchange>() {
            Ok(exchange) => {
                snapshot.market_stats_by_exchange.insert(exchange, stats_from_dto(stats));
            }
            Err(e) => log::debug!("Ignoring market stats: {}", e),
        }
    }
    Ok(snapshot)
}

pub fn quotes_from_dtos(dtos: Vec<QuoteDto>) -> Vec<Quote> {
    dtos.into_iter().filter_map(quote_from_dto).collect()
}

/// Validates the quote invariants. Unusable prices drop the quote; a
/// percentage signed against the absolute change is re-signed to match.
pub fn quote_from_dto(dto: QuoteDto) -> Option<Quote> {
    let symbol = dto.symbol.trim().to_string();
    let qualified = dto
        .yahoo_symbol
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if symbol.is_empty() && qualified.is_none() {
        log::warn!("Dropping quote without a symbol");
        return None;
    }

    let price = match dto.price {
        Some(p) if p.is_finite() && p >= 0.0 => p,
        other => {
            log::warn!("Dropping quote {} with unusable price {:?}", symbol, other);
            return None;
        }
    };

    let absolute_change = dto.change.filter(|c| c.is_finite()).unwrap_or(0.0);
    let mut percent_change = dto.change_percent.filter(|c| c.is_finite()).unwrap_or(0.0);
    if absolute_change != 0.0 && percent_change != 0.0 && absolute_change.signum() != percent_change.signum() {
        log::debug!("Re-signing percent change of {} to match absolute change", symbol);
        percent_change = percent_change.abs() * absolute_change.signum();
    }

    let display_name = dto
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| symbol.clone());

    Some(Quote {
        symbol,
        exchange_qualified_symbol: qualified,
        display_name,
        price,
        absolute_change,
        percent_change,
        currency_code: dto.currency.unwrap_or_else(|| "INR".to_string()),
    })
}

fn history_point_from_dto(dto: HistoryPointDto) -> Option<HistoryPoint> {
    let price = dto.price?;
    Some(HistoryPoint {
        label: dto.date,
        price,
        volume: dto.volume.unwrap_or(0.0),
    })
}

fn stats_from_dto(dto: MarketStatsDto) -> MarketStats {
    MarketStats {
        today_high: dto.today_high.unwrap_or(0.0),
        today_low: dto.today_low.unwrap_or(0.0),
        advances: dto.advances.unwrap_or(0),
        declines: dto.declines.unwrap_or(0),
        unchanged: dto.unchanged.unwrap_or(0),
    }
}

fn timestamp_from_dto(dto: TimestampDto) -> Option<DateTime<Utc>> {
    match dto {
        TimestampDto::Millis(ms) => Utc.timestamp_millis_opt(ms).single(),
        TimestampDto::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_envelope() {
        let body = r#"{"success":true,"data":{"symbol":"TCS","yahooSymbol":"TCS.NS","name":"Tata Consultancy Services","price":3850.5,"change":-12.3,"changePercent":0.32,"currency":"INR"}}"#;
        let quote = parse_quote_response(body).unwrap();
        assert_eq!(quote.exchange_qualified_symbol.as_deref(), Some("TCS.NS"));
        assert_eq!(quote.display_name, "Tata Consultancy Services");
        assert_eq!(quote.percent_change, -0.32);
        assert!(quote.is_consistent());
    }

    #[test]
    fn failed_envelope_is_api_error() {
        let body = r#"{"success":false,"error":"Symbol not found"}"#;
        match parse_quote_response(body) {
            Err(ApplicationError::ApiError(msg)) => assert_eq!(msg, "Symbol not found"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_quote_response("<html>"), Err(ApplicationError::JsonError(_))));
    }

    #[test]
    fn search_drops_unusable_quotes() {
        let body = r#"{"success":true,"data":{"results":[
            {"symbol":"INFY","yahooSymbol":"INFY.NS","name":"Infosys","price":1500},
            {"symbol":"BAD","price":-4},
            {"symbol":"NOPRICE"}
        ]}}"#;
        let results = parse_search_response(body).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "INFY");
    }

    #[test]
    fn history_accepts_time_and_close_aliases() {
        let body = r#"{"success":true,"data":{"prices":[
            {"date":"2024-03-01","price":100.0,"volume":10},
            {"time":"10:15","close":101.5},
            {"date":"2024-03-03"}
        ]}}"#;
        let points = parse_history_response(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], HistoryPoint::new("10:15", 101.5, 0.0));
    }

    #[test]
    fn exchange_snapshot_with_stats() {
        let body = r#"{"success":true,"data":{
            "indices":[{"symbol":"SENSEX","yahooSymbol":"^BSESN","price":73000}],
            "gainers":[{"symbol":"TCS","yahooSymbol":"TCS.BO","price":10,"change":1,"changePercent":10}],
            "losers":[],
            "stats":{"todayHigh":73500,"todayLow":72800,"advances":1800,"declines":1200,"unchanged":90},
            "timestamp":"2024-03-01T09:30:00Z"
        }}"#;
        let snapshot = parse_exchange_snapshot_response(body).unwrap();
        assert_eq!(snapshot.indices.len(), 1);
        assert_eq!(snapshot.stats.map(|s| s.advances), Some(1800));
        assert!(snapshot.timestamp.is_some());
    }

    #[test]
    fn snapshot_event_is_reranked() {
        let data = r#"{
            "indices":[],
            "gainers":[
                {"symbol":"TCS","yahooSymbol":"TCS.NS","price":10,"change":1,"changePercent":1},
                {"symbol":"SBIN","yahooSymbol":"SBIN.NS","price":10,"change":-1,"changePercent":-1}
            ],
            "losers":[{"symbol":"TCS","yahooSymbol":"TCS.BO","price":10,"change":0.5,"changePercent":0.5}],
            "marketStats":{"NSE":{"advances":5},"BSE":{"declines":3},"MCX":{}},
            "timestamp":1709285400000
        }"#;
        let now = Utc::now();
        let snapshot = parse_snapshot_event(data, now).unwrap();

        assert_eq!(snapshot.gainers.len(), 1);
        assert_eq!(snapshot.gainers[0].symbol, "TCS");
        assert_eq!(snapshot.losers.len(), 1);
        assert_eq!(snapshot.losers[0].symbol, "SBIN");
        assert_eq!(snapshot.market_stats_by_exchange.len(), 2);
        assert_ne!(snapshot.timestamp, now);
    }
}
