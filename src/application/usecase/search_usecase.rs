// src/application/usecase/search_usecase.rs
// Search-as-you-type: instant local ranking backed by a debounced remote search

use std::time::{Duration, Instant};

use crate::application::service::{RequestSlot, RequestToken, TtlCache};
use crate::domain::errors::MarketDataResult;
use crate::domain::models::{Exchange, Quote};
use crate::domain::service::search::{normalize_query, rank, MIN_QUERY_LEN, RESULT_LIMIT};
use crate::domain::service::snapshot::merge_by_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    /// Instant results shown, remote search pending
    Loading,
    Ready,
    NoResults,
    /// Remote search failed; instant results are kept
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<Quote>,
    pub status: SearchStatus,
    pub from_remote: bool,
}

/// A remote search the caller should run after `delay`, then report back
/// with `on_remote_result`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSearch {
    pub token: RequestToken,
    pub query: String,
    pub exchange: Exchange,
    pub delay: Duration,
}

pub struct SearchUseCase {
    debounce: Duration,
    slot: RequestSlot,
    cache: TtlCache<(String, Exchange), Vec<Quote>>,
    instant: Vec<Quote>,
    view: SearchView,
}

impl SearchUseCase {
    pub fn new(debounce: Duration, cache_ttl: Duration) -> Self {
        Self {
            debounce,
            slot: RequestSlot::new(),
            cache: TtlCache::new(cache_ttl),
            instant: Vec::new(),
            view: SearchView::default(),
        }
    }

    pub fn view(&self) -> &SearchView {
        &self.view
    }

    /// Handle for spawned searches to check whether they were superseded.
    pub fn slot(&self) -> RequestSlot {
        self.slot.clone()
    }

    /// Shows instant results right away. Returns the remote search to run,
    /// or `None` when the query is too short or the cache already answered.
    pub fn on_input(&mut self, query: &str, pool: &[Quote], exchange: Exchange, now: Instant) -> Option<RemoteSearch> {
        let normalized = normalize_query(query);
        if normalized.chars().count() < MIN_QUERY_LEN {
            self.slot.invalidate();
            self.instant.clear();
            self.view = SearchView {
                query: normalized,
                ..Default::default()
            };
            return None;
        }

        self.instant = rank(pool, &normalized).into_iter().map(|s| s.quote).collect();

        let key = (normalized.clone(), exchange);
        if let Some(cached) = self.cache.get(&key, now) {
            log::debug!("Search cache hit for {}", normalized);
            self.slot.invalidate();
            self.view.query = normalized;
            self.apply_remote(cached);
            return None;
        }

        let token = self.slot.issue();
        self.view = SearchView {
            query: normalized.clone(),
            results: self.instant.clone(),
            status: SearchStatus::Loading,
            from_remote: false,
        };
        Some(RemoteSearch {
            token,
            query: normalized,
            exchange,
            delay: self.debounce,
        })
    }

    /// Applies a finished remote search. Returns false if it was superseded.
    pub fn on_remote_result(
        &mut self,
        request: &RemoteSearch,
        result: MarketDataResult<Vec<Quote>>,
        now: Instant,
    ) -> bool {
        if !self.slot.is_current(request.token) {
            log::debug!("Dropping superseded search results for {}", request.query);
            return false;
        }

        match result {
            Ok(results) => {
                self.cache.purge_expired(now);
                self.cache
                    .put((request.query.clone(), request.exchange), results.clone(), now);
                self.apply_remote(results);
            }
            Err(e) => {
                log::warn!("Search for {} failed: {}", request.query, e);
                self.view.results = self.instant.clone();
                self.view.status = SearchStatus::Unavailable;
                self.view.from_remote = false;
            }
        }
        true
    }

    /// Empties the view and abandons any pending search.
    pub fn clear(&mut self) {
        self.slot.invalidate();
        self.instant.clear();
        self.view = SearchView::default();
    }

    fn apply_remote(&mut self, results: Vec<Quote>) {
        let mut remote = merge_by_key(&results);
        remote.truncate(RESULT_LIMIT);

        if !remote.is_empty() {
            self.view.results = remote;
            self.view.status = SearchStatus::Ready;
            self.view.from_remote = true;
        } else if !self.instant.is_empty() {
            self.view.results = self.instant.clone();
            self.view.status = SearchStatus::Ready;
            self.view.from_remote = false;
        } else {
            self.view.results.clear();
            self.view.status = SearchStatus::NoResults;
            self.view.from_remote = false;
        }
    }
}
