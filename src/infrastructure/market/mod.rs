// src/infrastructure/market/mod.rs
// HTTP market data repository for the brokerage provider API

pub mod sse;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use hyper::client::HttpConnector;
use hyper::header::ACCEPT;
use hyper::{Body, Client, Request, Uri};
use hyper_tls::HttpsConnector;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use crate::application::dto::parser::{
    parse_exchange_snapshot_response, parse_history_response, parse_quote_response,
    parse_search_response, parse_snapshot_event,
};
use crate::config::Config;
use crate::domain::errors::{MarketDataError, MarketDataResult};
use crate::domain::models::{
    Exchange, ExchangeSnapshot, HistoryPeriod, HistoryPoint, MarketSnapshot, Quote,
};
use crate::domain::repository::MarketDataRepository;
use crate::domain::service::search::{normalize_query, MIN_QUERY_LEN};
use sse::SseDecoder;

const QUOTE_PATH: &str = "api/stocks/quote";
const SEARCH_PATH: &str = "api/stocks/search";
const HISTORY_PATH: &str = "api/stocks/history";
const INDICES_PATH: &str = "api/market/indices";
const STREAM_PATH: &str = "api/market/stream";

const SNAPSHOT_EVENT: &str = "snapshot";
const STREAM_BUFFER: usize = 32;

pub struct HttpMarketDataRepository {
    client: Client<HttpsConnector<HttpConnector>>,
    base_url: Url,
    timeout: Duration,
}

impl HttpMarketDataRepository {
    pub fn new(base_url: &str, timeout: Duration) -> MarketDataResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| MarketDataError::InvalidFormat(format!("Invalid base URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> MarketDataResult<Self> {
        Self::new(&config.api.base_url, config.request_timeout())
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> MarketDataResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| MarketDataError::InvalidFormat(format!("Invalid endpoint {}: {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    async fn get_body(&self, url: Url) -> MarketDataResult<String> {
        let uri = to_uri(&url)?;
        log::debug!("GET {}", url);

        let request = async {
            let response = self.client.get(uri).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(MarketDataError::Status(status.as_u16()));
            }
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            String::from_utf8(bytes.to_vec())
                .map_err(|e| MarketDataError::InvalidFormat(format!("Body is not UTF-8: {}", e)))
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| MarketDataError::Timeout(self.timeout_ms()))?
    }

    /// Reads snapshot events off the open stream until it ends or the
    /// receiver goes away.
    async fn pump_snapshots(mut body: Body, sender: mpsc::Sender<MarketSnapshot>) {
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    log::warn!("Snapshot stream interrupted: {}", e);
                    return;
                }
            };

            for frame in decoder.feed(&chunk) {
                if frame.event != SNAPSHOT_EVENT {
                    continue;
                }
                match parse_snapshot_event(&frame.data, Utc::now()) {
                    Ok(snapshot) => {
                        if sender.send(snapshot).await.is_err() {
                            log::debug!("Snapshot receiver dropped, closing stream");
                            return;
                        }
                    }
                    Err(e) => log::warn!("Skipping malformed snapshot event: {}", e),
                }
            }
        }
        log::info!("Snapshot stream closed by server");
    }
}

#[async_trait]
impl MarketDataRepository for HttpMarketDataRepository {
    async fn get_quote(&self, symbol: &str, exchange: Exchange) -> MarketDataResult<Quote> {
        let url = self.endpoint(QUOTE_PATH, &[("symbol", symbol), ("exchange", exchange.code())])?;
        let body = self.get_body(url).await?;
        Ok(parse_quote_response(&body)?)
    }

    async fn search(&self, query: &str, exchange: Exchange) -> MarketDataResult<Vec<Quote>> {
        let query = query.trim();
        if normalize_query(query).chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        let url = self.endpoint(SEARCH_PATH, &[("q", query), ("exchange", exchange.code())])?;
        let body = self.get_body(url).await?;
        Ok(parse_search_response(&body)?)
    }

    async fn get_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        exchange: Exchange,
    ) -> MarketDataResult<Vec<HistoryPoint>> {
        let url = self.endpoint(
            HISTORY_PATH,
            &[
                ("symbol", symbol),
                ("period", period.as_str()),
                ("exchange", exchange.code()),
            ],
        )?;
        let body = self.get_body(url).await?;
        Ok(parse_history_response(&body)?)
    }

    async fn get_exchange_snapshot(&self, exchange: Exchange) -> MarketDataResult<ExchangeSnapshot> {
        let url = self.endpoint(INDICES_PATH, &[("exchange", exchange.code())])?;
        let body = self.get_body(url).await?;
        Ok(parse_exchange_snapshot_response(&body)?)
    }

    async fn subscribe_snapshots(&self) -> MarketDataResult<mpsc::Receiver<MarketSnapshot>> {
        let url = self.endpoint(STREAM_PATH, &[])?;
        let request = Request::get(to_uri(&url)?)
            .header(ACCEPT, "text/event-stream")
            .body(Body::empty())
            .map_err(|e| MarketDataError::Stream(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| MarketDataError::Timeout(self.timeout_ms()))??;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status(status.as_u16()));
        }
        log::info!("Connected to snapshot stream at {}", url);

        let (sender, receiver) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(Self::pump_snapshots(response.into_body(), sender));
        Ok(receiver)
    }
}

fn to_uri(url: &Url) -> MarketDataResult<Uri> {
    url.as_str()
        .parse::<Uri>()
        .map_err(|e| MarketDataError::InvalidFormat(format!("Invalid URI {}: {}", url, e)))
}
