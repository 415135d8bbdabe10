// src/application/usecase/chart_usecase.rs
// Selected stock chart: history loading, exchange toggle and drag-range selection

use std::sync::{Arc, Mutex};

use crate::application::service::{RequestSlot, RequestToken};
use crate::chart::{
    DragRangePlugin, HoverCrosshairPlugin, LineChart, Painter, PlotArea, PointerEvent,
};
use crate::domain::errors::MarketDataResult;
use crate::domain::models::{DragSelection, Exchange, HistoryPeriod, HistoryPoint, Quote};
use crate::domain::service::symbol::{exchange_of, fetch_symbol_of, is_toggleable, requalify};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub token: RequestToken,
    pub symbol: String,
    pub period: HistoryPeriod,
    pub exchange: Exchange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub token: RequestToken,
    pub symbol: String,
    pub exchange: Exchange,
}

/// Fetches the caller should run for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequests {
    pub history: HistoryRequest,
    pub quote: Option<QuoteRequest>,
}

pub struct ChartUseCase {
    chart: LineChart,
    selection: Arc<Mutex<Option<DragSelection>>>,
    selected: Option<Quote>,
    exchange: Exchange,
    period: HistoryPeriod,
    history_slot: RequestSlot,
    quote_slot: RequestSlot,
}

impl ChartUseCase {
    pub fn new(plot_area: PlotArea, exchange: Exchange, period: HistoryPeriod) -> Self {
        let selection = Arc::new(Mutex::new(None));
        let sink = selection.clone();

        let mut chart = LineChart::new(plot_area);
        chart.register(Box::new(HoverCrosshairPlugin::default()));
        chart.register(Box::new(DragRangePlugin::new(Box::new(
            move |range: Option<&DragSelection>| match sink.lock() {
                Ok(mut current) => *current = range.cloned(),
                Err(e) => log::warn!("Drag selection state poisoned: {}", e),
            },
        ))));

        Self {
            chart,
            selection,
            selected: None,
            exchange,
            period,
            history_slot: RequestSlot::new(),
            quote_slot: RequestSlot::new(),
        }
    }

    pub fn selected(&self) -> Option<&Quote> {
        self.selected.as_ref()
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn period(&self) -> HistoryPeriod {
        self.period
    }

    pub fn history(&self) -> &[HistoryPoint] {
        self.chart.points()
    }

    pub fn shared_history(&self) -> Arc<[HistoryPoint]> {
        self.chart.shared_points()
    }

    /// New stock: previous series and selection are dropped immediately.
    /// Indices, rates and unsuffixed tickers always load from Primary.
    pub fn select_stock(&mut self, quote: Quote) -> ChartRequests {
        self.exchange = exchange_of(&quote);
        log::info!("Selected {} on {}", fetch_symbol_of(&quote), self.exchange);
        self.selected = Some(quote);
        self.chart.clear();
        self.clear_selection();
        self.issue_requests(true)
    }

    /// Refetches history for the new period, keeping the current series
    /// on screen until it arrives.
    pub fn change_period(&mut self, period: HistoryPeriod) -> Option<ChartRequests> {
        if period == self.period {
            return None;
        }
        self.period = period;
        self.selected.as_ref()?;
        self.clear_selection();
        Some(self.issue_requests(false))
    }

    /// Moves the selected stock to the other exchange. Indices, rates and
    /// unsuffixed tickers have no second listing and stay put.
    pub fn toggle_exchange(&mut self) -> Option<ChartRequests> {
        let current = self.selected.as_ref()?;
        if !is_toggleable(current) {
            log::debug!("{} has no listing to toggle to", fetch_symbol_of(current));
            return None;
        }
        let target = self.exchange.other();
        let moved = requalify(current, target);
        log::info!("Switching {} to {}", fetch_symbol_of(&moved), target);
        self.selected = Some(moved);
        self.exchange = target;
        self.clear_selection();
        Some(self.issue_requests(true))
    }

    /// Returns false when the response was superseded or failed; the last
    /// good series stays on screen in both cases.
    pub fn apply_history(&mut self, token: RequestToken, result: MarketDataResult<Vec<HistoryPoint>>) -> bool {
        if !self.history_slot.is_current(token) {
            log::debug!("Dropping superseded history response");
            return false;
        }
        match result {
            Ok(points) => {
                self.chart.set_data(points);
                true
            }
            Err(e) if e.is_transient() => {
                log::warn!("History load failed, keeping last series: {}", e);
                false
            }
            Err(e) => {
                log::info!("No history for the selected stock: {}", e);
                false
            }
        }
    }

    pub fn apply_quote(&mut self, token: RequestToken, result: MarketDataResult<Quote>) -> bool {
        if !self.quote_slot.is_current(token) {
            log::debug!("Dropping superseded quote response");
            return false;
        }
        let Some(selected) = self.selected.as_mut() else {
            return false;
        };
        match result {
            Ok(quote) => {
                selected.price = quote.price;
                selected.absolute_change = quote.absolute_change;
                selected.percent_change = quote.percent_change;
                if !quote.display_name.is_empty() {
                    selected.display_name = quote.display_name;
                }
                selected.currency_code = quote.currency_code;
                true
            }
            Err(e) => {
                log::warn!("Quote refresh failed: {}", e);
                false
            }
        }
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        self.chart.handle_event(event);
    }

    pub fn resize(&mut self, plot_area: PlotArea) {
        self.chart.resize(plot_area);
    }

    pub fn draw(&mut self, painter: &mut dyn Painter) {
        self.chart.draw(painter);
    }

    pub fn selection(&self) -> Option<DragSelection> {
        match self.selection.lock() {
            Ok(current) => current.clone(),
            Err(_) => None,
        }
    }

    /// `("+3.00 (+2.94%)", "01 Mar - 03 Mar")` for the active selection.
    pub fn selection_text(&self) -> Option<(String, String)> {
        self.selection()
            .map(|selection| (selection.summary_line(), selection.range_line()))
    }

    fn clear_selection(&mut self) {
        self.chart.reset_plugins();
        if let Ok(mut current) = self.selection.lock() {
            *current = None;
        }
    }

    fn issue_requests(&mut self, with_quote: bool) -> ChartRequests {
        let symbol = self
            .selected
            .as_ref()
            .map(fetch_symbol_of)
            .unwrap_or_default();
        let history = HistoryRequest {
            token: self.history_slot.issue(),
            symbol: symbol.clone(),
            period: self.period,
            exchange: self.exchange,
        };
        let quote = with_quote.then(|| QuoteRequest {
            token: self.quote_slot.issue(),
            symbol,
            exchange: self.exchange,
        });
        ChartRequests { history, quote }
    }
}
