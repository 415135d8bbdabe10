// src/application/usecase/snapshot_usecase.rs
// Live market snapshot with a one-shot fallback when the stream is down

use chrono::Utc;
use std::sync::Arc;

use crate::domain::errors::MarketDataError;
use crate::domain::models::{Exchange, MarketSnapshot, Quote};
use crate::domain::repository::MarketDataRepository;
use crate::domain::service::snapshot::combine_snapshots;

#[derive(Debug, Default)]
pub struct SnapshotUseCase {
    current: Option<Arc<MarketSnapshot>>,
}

impl SnapshotUseCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last good snapshot, if any has arrived.
    pub fn current(&self) -> Option<&MarketSnapshot> {
        self.current.as_deref()
    }

    pub fn shared(&self) -> Option<Arc<MarketSnapshot>> {
        self.current.clone()
    }

    /// Streamed snapshots are already combined and replace the view wholesale.
    pub fn apply_stream_snapshot(&mut self, snapshot: MarketSnapshot) {
        if self.current.is_none() {
            log::info!("First market snapshot received from stream");
        }
        self.current = Some(Arc::new(snapshot));
    }

    /// Returns true when the caller should run the one-shot fallback.
    pub fn on_stream_failure(&mut self, error: &MarketDataError) -> bool {
        if error.is_transient() {
            log::warn!("Snapshot stream unavailable: {}", error);
        } else {
            log::info!("Snapshot stream not offered by provider: {}", error);
        }
        self.current.is_none()
    }

    /// Fetches both exchanges concurrently and combines whatever succeeded.
    /// `None` only when both requests failed.
    pub async fn fetch_fallback(repository: Arc<dyn MarketDataRepository>) -> Option<MarketSnapshot> {
        let (primary, secondary) = tokio::join!(
            repository.get_exchange_snapshot(Exchange::Primary),
            repository.get_exchange_snapshot(Exchange::Secondary)
        );

        let primary = primary
            .map_err(|e| log::warn!("Fallback fetch for {} failed: {}", Exchange::Primary, e))
            .ok();
        let secondary = secondary
            .map_err(|e| log::warn!("Fallback fetch for {} failed: {}", Exchange::Secondary, e))
            .ok();

        if primary.is_none() && secondary.is_none() {
            return None;
        }
        Some(combine_snapshots(primary.as_ref(), secondary.as_ref(), Utc::now()))
    }

    /// A stream snapshot that arrived in the meantime wins over the fallback.
    pub fn apply_fallback(&mut self, snapshot: Option<MarketSnapshot>) -> bool {
        match snapshot {
            Some(_) if self.current.is_some() => {
                log::debug!("Discarding fallback snapshot, stream already delivered one");
                false
            }
            Some(snapshot) => {
                log::info!("Using fallback market snapshot");
                self.current = Some(Arc::new(snapshot));
                true
            }
            None => false,
        }
    }

    /// Quotes already on screen, used for instant search.
    pub fn search_pool(&self, selected: Option<&Quote>) -> Vec<Quote> {
        let mut pool = Vec::new();
        if let Some(snapshot) = &self.current {
            pool.extend(snapshot.indices.iter().cloned());
            pool.extend(snapshot.gainers.iter().cloned());
            pool.extend(snapshot.losers.iter().cloned());
        }
        if let Some(quote) = selected {
            pool.push(quote.clone());
        }
        pool
    }
}
