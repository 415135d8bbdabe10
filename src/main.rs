// src/main.rs
use brokerage_dashboard::adapter::{DashboardCoordinator, DashboardEvent, DashboardHandle};
use brokerage_dashboard::chart::PlotArea;
use brokerage_dashboard::config::Config;
use brokerage_dashboard::domain::errors::{AppError, AppResult};
use brokerage_dashboard::domain::models::Quote;
use brokerage_dashboard::domain::service::symbol::base_symbol_of;
use brokerage_dashboard::infrastructure::HttpMarketDataRepository;

use std::sync::Arc;
use tokio::signal::ctrl_c;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration (CONFIG_FILE, falling back to the environment)
    let config = Config::load()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting brokerage_dashboard v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using market data provider at {}", config.api.base_url);

    let repository = Arc::new(HttpMarketDataRepository::from_config(&config)?);
    let coordinator =
        DashboardCoordinator::new(repository, &config, PlotArea::new(48.0, 16.0, 960.0, 420.0));
    let handle = coordinator.handle();
    let runner = tokio::spawn(coordinator.run());

    tokio::spawn(log_state_changes(handle.clone()));

    // Optional ticker to open on start, e.g. `brokerage_dashboard TCS.NS`
    if let Some(symbol) = std::env::args().nth(1) {
        let symbol = symbol.trim().to_uppercase();
        let quote = Quote::new(&symbol, &symbol, 0.0).with_qualified_symbol(&symbol);
        let quote = Quote {
            symbol: base_symbol_of(&quote),
            ..quote
        };
        log::info!("Opening chart for {}", symbol);
        handle.send(DashboardEvent::SelectStock(quote)).await?;
    }

    // Wait for shutdown signal
    log::info!("Dashboard is running. Press Ctrl+C to stop.");
    ctrl_c().await?;

    // Shutdown
    log::info!("Shutting down...");
    handle.send(DashboardEvent::Shutdown).await?;
    runner
        .await
        .map_err(|e| AppError::Channel(format!("Coordinator task failed: {}", e)))?;

    log::info!("Shutdown complete. Goodbye!");
    Ok(())
}

/// Headless stand-in for the view layer.
async fn log_state_changes(handle: DashboardHandle) {
    let mut state = handle.subscribe();
    let mut last_timestamp = None;
    let mut last_history_len = 0;

    while state.changed().await.is_ok() {
        let current = state.borrow_and_update().clone();

        if let Some(snapshot) = &current.snapshot {
            if last_timestamp != Some(snapshot.timestamp) {
                last_timestamp = Some(snapshot.timestamp);
                log::info!(
                    "Snapshot {}: {} indices, top gainer {}, top loser {}",
                    snapshot.timestamp,
                    snapshot.indices.len(),
                    snapshot.gainers.first().map(|q| q.symbol.as_str()).unwrap_or("-"),
                    snapshot.losers.first().map(|q| q.symbol.as_str()).unwrap_or("-"),
                );
            }
        }

        if current.history.len() != last_history_len {
            last_history_len = current.history.len();
            if let Some(quote) = &current.selected {
                log::info!(
                    "{} {} ({}): {} points, last price {:.2}",
                    quote.symbol,
                    current.exchange,
                    current.period,
                    last_history_len,
                    quote.price
                );
            }
        }
    }
}
