// src/adapter/coordinator.rs
// Dashboard coordinator: one task owns all state, network work reports back over a channel

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::application::service::RequestToken;
use crate::application::usecase::{
    ChartRequests, ChartUseCase, HistoryRequest, QuoteRequest, RemoteSearch, SearchUseCase,
    SearchView, SnapshotUseCase,
};
use crate::chart::{PlotArea, PointerEvent};
use crate::config::Config;
use crate::domain::errors::{AppError, AppResult, MarketDataError, MarketDataResult};
use crate::domain::models::{
    DragSelection, Exchange, HistoryPeriod, HistoryPoint, MarketSnapshot, Quote,
};
use crate::domain::repository::MarketDataRepository;

const EVENT_BUFFER: usize = 100;

#[derive(Debug)]
pub enum DashboardEvent {
    SnapshotReceived(MarketSnapshot),
    StreamFailed(MarketDataError),
    StreamClosed,
    FallbackLoaded(Option<MarketSnapshot>),
    SearchInput(String),
    SearchCompleted {
        request: RemoteSearch,
        result: MarketDataResult<Vec<Quote>>,
    },
    SelectStock(Quote),
    ChangePeriod(HistoryPeriod),
    ToggleExchange,
    Pointer(PointerEvent),
    Resize(PlotArea),
    HistoryLoaded {
        token: RequestToken,
        result: MarketDataResult<Vec<HistoryPoint>>,
    },
    QuoteLoaded {
        token: RequestToken,
        result: MarketDataResult<Quote>,
    },
    Shutdown,
}

/// What the view renders. Republished only when an event changed it; the
/// snapshot and series are shared, not copied.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub snapshot: Option<Arc<MarketSnapshot>>,
    pub search: SearchView,
    pub selected: Option<Quote>,
    pub exchange: Exchange,
    pub period: HistoryPeriod,
    pub history: Arc<[HistoryPoint]>,
    pub selection: Option<DragSelection>,
}

#[derive(Clone)]
pub struct DashboardHandle {
    events: mpsc::Sender<DashboardEvent>,
    state: watch::Receiver<DashboardState>,
}

impl DashboardHandle {
    pub async fn send(&self, event: DashboardEvent) -> AppResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|e| AppError::Channel(e.to_string()))
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }
}

pub struct DashboardCoordinator {
    repository: Arc<dyn MarketDataRepository>,
    snapshot: SnapshotUseCase,
    search: SearchUseCase,
    chart: ChartUseCase,
    event_sender: mpsc::Sender<DashboardEvent>,
    event_receiver: mpsc::Receiver<DashboardEvent>,
    state_sender: watch::Sender<DashboardState>,
    state_receiver: watch::Receiver<DashboardState>,
    stream_task: Option<JoinHandle<()>>,
}

impl DashboardCoordinator {
    pub fn new(repository: Arc<dyn MarketDataRepository>, config: &Config, plot_area: PlotArea) -> Self {
        let (event_sender, event_receiver) = mpsc::channel(EVENT_BUFFER);

        let snapshot = SnapshotUseCase::new();
        let search = SearchUseCase::new(config.search_debounce(), config.search_cache_ttl());
        let chart = ChartUseCase::new(
            plot_area,
            config.dashboard.default_exchange,
            config.dashboard.default_period,
        );

        let initial = DashboardState {
            snapshot: None,
            search: SearchView::default(),
            selected: None,
            exchange: chart.exchange(),
            period: chart.period(),
            history: chart.shared_history(),
            selection: None,
        };
        let (state_sender, state_receiver) = watch::channel(initial);

        Self {
            repository,
            snapshot,
            search,
            chart,
            event_sender,
            event_receiver,
            state_sender,
            state_receiver,
            stream_task: None,
        }
    }

    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle {
            events: self.event_sender.clone(),
            state: self.state_receiver.clone(),
        }
    }

    /// Opens the snapshot stream and processes events until `Shutdown`.
    pub async fn run(mut self) {
        log::info!("Dashboard coordinator started");
        self.start_stream();

        while let Some(event) = self.event_receiver.recv().await {
            if matches!(event, DashboardEvent::Shutdown) {
                break;
            }
            self.handle_event(event);
            self.publish();
        }

        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        log::info!("Dashboard coordinator stopped");
    }

    fn handle_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::SnapshotReceived(snapshot) => self.snapshot.apply_stream_snapshot(snapshot),
            DashboardEvent::StreamFailed(error) => {
                if self.snapshot.on_stream_failure(&error) {
                    self.spawn_fallback();
                }
            }
            DashboardEvent::StreamClosed => {
                let error = MarketDataError::Stream("closed".to_string());
                if self.snapshot.on_stream_failure(&error) {
                    self.spawn_fallback();
                }
            }
            DashboardEvent::FallbackLoaded(snapshot) => {
                self.snapshot.apply_fallback(snapshot);
            }
            DashboardEvent::SearchInput(query) => {
                let pool = self.snapshot.search_pool(self.chart.selected());
                let now = Instant::now().into_std();
                if let Some(request) = self.search.on_input(&query, &pool, self.chart.exchange(), now) {
                    self.spawn_search(request);
                }
            }
            DashboardEvent::SearchCompleted { request, result } => {
                self.search
                    .on_remote_result(&request, result, Instant::now().into_std());
            }
            DashboardEvent::SelectStock(quote) => {
                self.search.clear();
                let requests = self.chart.select_stock(quote);
                self.spawn_chart_requests(requests);
            }
            DashboardEvent::ChangePeriod(period) => {
                if let Some(requests) = self.chart.change_period(period) {
                    self.spawn_chart_requests(requests);
                }
            }
            DashboardEvent::ToggleExchange => {
                if let Some(requests) = self.chart.toggle_exchange() {
                    self.spawn_chart_requests(requests);
                }
            }
            DashboardEvent::Pointer(pointer) => self.chart.handle_pointer(&pointer),
            DashboardEvent::Resize(plot_area) => self.chart.resize(plot_area),
            DashboardEvent::HistoryLoaded { token, result } => {
                self.chart.apply_history(token, result);
            }
            DashboardEvent::QuoteLoaded { token, result } => {
                self.chart.apply_quote(token, result);
            }
            DashboardEvent::Shutdown => {}
        }
    }

    fn publish(&self) {
        let next = DashboardState {
            snapshot: self.snapshot.shared(),
            search: self.search.view().clone(),
            selected: self.chart.selected().cloned(),
            exchange: self.chart.exchange(),
            period: self.chart.period(),
            history: self.chart.shared_history(),
            selection: self.chart.selection(),
        };
        self.state_sender.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    fn start_stream(&mut self) {
        let repository = self.repository.clone();
        let sender = self.event_sender.clone();

        self.stream_task = Some(tokio::spawn(async move {
            let mut receiver = match repository.subscribe_snapshots().await {
                Ok(receiver) => receiver,
                Err(e) => {
                    let _ = sender.send(DashboardEvent::StreamFailed(e)).await;
                    return;
                }
            };
            while let Some(snapshot) = receiver.recv().await {
                if sender.send(DashboardEvent::SnapshotReceived(snapshot)).await.is_err() {
                    return;
                }
            }
            let _ = sender.send(DashboardEvent::StreamClosed).await;
        }));
    }

    fn spawn_fallback(&self) {
        let repository = self.repository.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let snapshot = SnapshotUseCase::fetch_fallback(repository).await;
            let _ = sender.send(DashboardEvent::FallbackLoaded(snapshot)).await;
        });
    }

    /// Waits out the debounce window; a newer keystroke in the meantime
    /// abandons the request before it reaches the network.
    fn spawn_search(&self, request: RemoteSearch) {
        let repository = self.repository.clone();
        let sender = self.event_sender.clone();
        let slot = self.search.slot();

        tokio::spawn(async move {
            tokio::time::sleep(request.delay).await;
            if !slot.is_current(request.token) {
                log::debug!("Search for {} superseded during debounce", request.query);
                return;
            }
            let result = repository.search(&request.query, request.exchange).await;
            let _ = sender
                .send(DashboardEvent::SearchCompleted { request, result })
                .await;
        });
    }

    fn spawn_chart_requests(&self, requests: ChartRequests) {
        self.spawn_history(requests.history);
        if let Some(quote) = requests.quote {
            self.spawn_quote(quote);
        }
    }

    fn spawn_history(&self, request: HistoryRequest) {
        let repository = self.repository.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = repository
                .get_history(&request.symbol, request.period, request.exchange)
                .await;
            let _ = sender
                .send(DashboardEvent::HistoryLoaded {
                    token: request.token,
                    result,
                })
                .await;
        });
    }

    fn spawn_quote(&self, request: QuoteRequest) {
        let repository = self.repository.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let result = repository.get_quote(&request.symbol, request.exchange).await;
            let _ = sender
                .send(DashboardEvent::QuoteLoaded {
                    token: request.token,
                    result,
                })
                .await;
        });
    }
}
