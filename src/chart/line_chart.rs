// src/chart/line_chart.rs
// Line chart over a history series with plugin hooks

use std::sync::Arc;

use super::surface::{ChartView, Painter, PlotArea, Stroke, TooltipPoint};
use super::{resolve_index, ChartPlugin, PointerEvent, PointerPhase};
use crate::domain::models::HistoryPoint;

const PRICE_PADDING: f64 = 0.05;

/// Geometry and hover state, kept apart from the plugins so both can be
/// borrowed at once.
#[derive(Debug, Clone)]
struct ChartModel {
    points: Arc<[HistoryPoint]>,
    plot_area: PlotArea,
    price_low: f64,
    price_high: f64,
    hover_index: Option<usize>,
}

impl ChartModel {
    fn new(plot_area: PlotArea) -> Self {
        Self {
            points: Arc::from(Vec::new()),
            plot_area,
            price_low: 0.0,
            price_high: 1.0,
            hover_index: None,
        }
    }

    fn set_points(&mut self, points: Vec<HistoryPoint>) {
        let (low, high) = padded_range(&points);
        self.points = Arc::from(points);
        self.price_low = low;
        self.price_high = high;
        self.hover_index = None;
    }

    /// Native tooltip: follows the pointer inside the plot, hides on leave.
    fn track_hover(&mut self, event: &PointerEvent) {
        match event.phase {
            PointerPhase::Leave => self.hover_index = None,
            PointerPhase::Down | PointerPhase::Move => {
                let index = if self.plot_area.contains(event.x, event.y) {
                    resolve_index(&*self, event.x)
                } else {
                    None
                };
                self.hover_index = index;
            }
            PointerPhase::Up | PointerPhase::Cancel => {}
        }
    }
}

impl ChartView for ChartModel {
    fn plot_area(&self) -> PlotArea {
        self.plot_area
    }

    fn data_len(&self) -> usize {
        self.points.len()
    }

    fn value_for_pixel(&self, x: f64) -> f64 {
        let len = self.points.len();
        let width = self.plot_area.width();
        if len <= 1 || width <= 0.0 {
            return 0.0;
        }
        (x - self.plot_area.left) / width * (len - 1) as f64
    }

    fn pixel_for_index(&self, index: usize) -> f64 {
        let len = self.points.len();
        let area = self.plot_area;
        if len <= 1 {
            return area.left + area.width() / 2.0;
        }
        area.left + area.width() * index as f64 / (len - 1) as f64
    }

    fn pixel_for_price(&self, price: f64) -> f64 {
        let area = self.plot_area;
        let span = self.price_high - self.price_low;
        if span <= 0.0 {
            return area.top + area.height() / 2.0;
        }
        area.bottom - (price - self.price_low) / span * area.height()
    }

    fn price_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).map(|p| p.price)
    }

    fn label_at(&self, index: usize) -> Option<&str> {
        self.points.get(index).map(|p| p.label.as_str())
    }

    fn active_tooltip(&self) -> Option<TooltipPoint> {
        let index = self.hover_index?;
        let price = self.price_at(index).filter(|p| p.is_finite())?;
        Some(TooltipPoint {
            index,
            x: self.pixel_for_index(index),
            y: self.pixel_for_price(price),
        })
    }
}

pub struct LineChart {
    model: ChartModel,
    line_stroke: Stroke,
    plugins: Vec<Box<dyn ChartPlugin>>,
}

impl LineChart {
    pub fn new(plot_area: PlotArea) -> Self {
        Self {
            model: ChartModel::new(plot_area),
            line_stroke: Stroke::solid("#2563eb", 2.0),
            plugins: Vec::new(),
        }
    }

    /// Plugins receive events and draw in registration order.
    pub fn register(&mut self, plugin: Box<dyn ChartPlugin>) {
        log::debug!("Registering chart plugin {}", plugin.id());
        self.plugins.push(plugin);
    }

    pub fn plugin_ids(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.id()).collect()
    }

    pub fn view(&self) -> &dyn ChartView {
        &self.model
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.model.points
    }

    /// Handle to the current series without copying it.
    pub fn shared_points(&self) -> Arc<[HistoryPoint]> {
        self.model.points.clone()
    }

    /// Replaces the series. Plugins are reset before the new data lands.
    pub fn set_data(&mut self, points: Vec<HistoryPoint>) {
        self.reset_plugins();
        self.model.set_points(points);
    }

    pub fn clear(&mut self) {
        self.set_data(Vec::new());
    }

    pub fn resize(&mut self, plot_area: PlotArea) {
        self.model.plot_area = plot_area;
    }

    pub fn reset_plugins(&mut self) {
        for plugin in self.plugins.iter_mut() {
            plugin.reset();
        }
    }

    pub fn handle_event(&mut self, event: &PointerEvent) {
        self.model.track_hover(event);
        for plugin in self.plugins.iter_mut() {
            plugin.on_event(&self.model, event);
        }
    }

    pub fn draw(&mut self, painter: &mut dyn Painter) {
        let points: Vec<(f64, f64)> = self
            .model
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.price.is_finite())
            .map(|(i, p)| (self.model.pixel_for_index(i), self.model.pixel_for_price(p.price)))
            .collect();
        if points.len() >= 2 {
            painter.polyline(&points, &self.line_stroke);
        }

        for plugin in self.plugins.iter_mut() {
            painter.save();
            plugin.after_draw(&self.model, painter);
            painter.restore();
        }
    }
}

fn padded_range(points: &[HistoryPoint]) -> (f64, f64) {
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for price in points.iter().map(|p| p.price).filter(|p| p.is_finite()) {
        low = low.min(price);
        high = high.max(price);
    }
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if high == low {
        return (low - 1.0, high + 1.0);
    }
    let pad = (high - low) * PRICE_PADDING;
    (low - pad, high + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::surface::testing::{DrawOp, RecordingPainter};
    use std::sync::{Arc, Mutex};

    struct CountingPlugin {
        resets: Arc<Mutex<u32>>,
        events: Arc<Mutex<u32>>,
    }

    impl ChartPlugin for CountingPlugin {
        fn id(&self) -> &'static str {
            "counting"
        }

        fn on_event(&mut self, _chart: &dyn ChartView, _event: &PointerEvent) {
            *self.events.lock().unwrap() += 1;
        }

        fn reset(&mut self) {
            *self.resets.lock().unwrap() += 1;
        }
    }

    fn series(prices: &[f64]) -> Vec<HistoryPoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| HistoryPoint::new(&format!("D{}", i), *p, 0.0))
            .collect()
    }

    #[test]
    fn maps_indices_across_plot_width() {
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        chart.set_data(series(&[100.0, 102.0, 98.0, 105.0]));

        let view = chart.view();
        assert_eq!(view.pixel_for_index(0), 0.0);
        assert_eq!(view.pixel_for_index(3), 300.0);
        assert_eq!(view.value_for_pixel(150.0), 1.5);
        assert_eq!(resolve_index(view, 140.0), Some(1));
        assert_eq!(resolve_index(view, -50.0), Some(0));
        assert_eq!(resolve_index(view, 9000.0), Some(3));
    }

    #[test]
    fn higher_prices_sit_higher() {
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        chart.set_data(series(&[100.0, 110.0]));
        let view = chart.view();
        assert!(view.pixel_for_price(110.0) < view.pixel_for_price(100.0));
    }

    #[test]
    fn set_data_resets_plugins_first() {
        let resets = Arc::new(Mutex::new(0));
        let events = Arc::new(Mutex::new(0));
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        chart.register(Box::new(CountingPlugin {
            resets: resets.clone(),
            events: events.clone(),
        }));

        chart.set_data(series(&[1.0, 2.0]));
        chart.handle_event(&PointerEvent::mouse_move(10.0, 10.0, 0));

        assert_eq!(*resets.lock().unwrap(), 1);
        assert_eq!(*events.lock().unwrap(), 1);
        assert_eq!(chart.plugin_ids(), vec!["counting"]);
    }

    #[test]
    fn tooltip_follows_pointer_inside_plot() {
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        chart.set_data(series(&[100.0, 102.0, 98.0, 105.0]));

        chart.handle_event(&PointerEvent::mouse_move(210.0, 50.0, 0));
        assert_eq!(chart.view().active_tooltip().map(|t| t.index), Some(2));

        chart.handle_event(&PointerEvent::mouse_move(210.0, 150.0, 0));
        assert!(chart.view().active_tooltip().is_none());

        chart.handle_event(&PointerEvent::mouse_move(10.0, 50.0, 0));
        chart.handle_event(&PointerEvent::leave());
        assert!(chart.view().active_tooltip().is_none());
    }

    #[test]
    fn draws_line_only_with_two_finite_points() {
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        let mut painter = RecordingPainter::default();
        chart.set_data(series(&[f64::NAN, 5.0]));
        chart.draw(&mut painter);
        assert!(!painter.draws_anything());

        chart.set_data(series(&[4.0, f64::NAN, 5.0]));
        chart.draw(&mut painter);
        assert!(matches!(&painter.ops[0], DrawOp::Polyline { points } if points.len() == 2));
    }
}
