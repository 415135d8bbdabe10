// src/chart/drag_range.rs
// Drag-to-compare range selection on the price chart

use super::surface::{ChartView, Painter, PlotArea, Rect, Stroke, TextStyle};
use super::{resolve_index, ChartPlugin, PointerEvent, PointerPhase};
use crate::domain::models::DragSelection;

pub const DRAG_RANGE_PLUGIN_ID: &str = "drag-range";

/// Receives the current selection, or `None` once it is cleared.
pub type RangeCallback = Box<dyn FnMut(Option<&DragSelection>) + Send>;

#[derive(Debug, Clone, PartialEq)]
pub struct DragRangeOptions {
    pub gain_color: String,
    pub loss_color: String,
    pub gain_band: String,
    pub loss_band: String,
    pub handle_radius: f64,
    pub label_background: String,
    pub label_secondary_color: String,
    pub label_font_size: f64,
    pub label_padding: f64,
    pub label_margin: f64,
}

impl Default for DragRangeOptions {
    fn default() -> Self {
        Self {
            gain_color: "#16a34a".to_string(),
            loss_color: "#dc2626".to_string(),
            gain_band: "rgba(22, 163, 74, 0.12)".to_string(),
            loss_band: "rgba(220, 38, 38, 0.12)".to_string(),
            handle_radius: 5.0,
            label_background: "rgba(15, 23, 42, 0.92)".to_string(),
            label_secondary_color: "#cbd5e1".to_string(),
            label_font_size: 12.0,
            label_padding: 8.0,
            label_margin: 8.0,
        }
    }
}

/// Identity of an emitted selection, used to skip redundant callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SelectionKey {
    start_index: usize,
    end_index: usize,
    start_price: f64,
    end_price: f64,
}

impl SelectionKey {
    fn of(selection: &DragSelection) -> Self {
        Self {
            start_index: selection.start_index,
            end_index: selection.end_index,
            start_price: selection.start_price,
            end_price: selection.end_price,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DragState {
    pointer_down: bool,
    start_index: Option<usize>,
    current_index: Option<usize>,
    active: bool,
    last_emitted: Option<SelectionKey>,
}

impl DragState {
    fn span(&self) -> Option<(usize, usize)> {
        if !self.active {
            return None;
        }
        Some((self.start_index?, self.current_index?))
    }
}

/// Idle until a press lands inside the plot, then Dragging until release,
/// cancel, or the pointer leaves the canvas.
pub struct DragRangePlugin {
    options: DragRangeOptions,
    state: DragState,
    on_range_change: RangeCallback,
}

impl DragRangePlugin {
    pub fn new(on_range_change: RangeCallback) -> Self {
        Self::with_options(DragRangeOptions::default(), on_range_change)
    }

    pub fn with_options(options: DragRangeOptions, on_range_change: RangeCallback) -> Self {
        Self {
            options,
            state: DragState::default(),
            on_range_change,
        }
    }

    fn begin(&mut self, chart: &dyn ChartView, event: &PointerEvent) {
        if !event.is_primary_press() || !chart.plot_area().contains(event.x, event.y) {
            return;
        }
        let Some(index) = resolve_index(chart, event.x) else {
            return;
        };
        log::trace!("Drag range started at index {}", index);
        self.state.pointer_down = true;
        self.state.start_index = Some(index);
        self.state.current_index = Some(index);
        self.state.active = true;
        self.emit_current(chart);
    }

    fn track(&mut self, chart: &dyn ChartView, event: &PointerEvent) {
        if !self.state.active || !self.state.pointer_down {
            return;
        }
        if !event.is_pressed() {
            self.cancel();
            return;
        }
        let Some(index) = resolve_index(chart, event.x) else {
            return;
        };
        self.state.current_index = Some(index);
        self.emit_current(chart);
    }

    /// Back to Idle; a cleared selection is announced once.
    fn cancel(&mut self) {
        let had_selection = self.state.last_emitted.is_some();
        if self.state.active {
            log::trace!("Drag range cleared");
        }
        self.state = DragState::default();
        if had_selection {
            (self.on_range_change)(None);
        }
    }

    fn emit_current(&mut self, chart: &dyn ChartView) {
        let Some((anchor, current)) = self.state.span() else {
            return;
        };
        let next = if anchor == current {
            None
        } else {
            match build_selection(chart, anchor, current) {
                Some(selection) => Some(selection),
                None => return,
            }
        };

        let key = next.as_ref().map(SelectionKey::of);
        if key == self.state.last_emitted {
            return;
        }
        self.state.last_emitted = key;
        (self.on_range_change)(next.as_ref());
    }

    fn paint(&self, selection: &DragSelection, area: PlotArea, tooltip_visible: bool, painter: &mut dyn Painter) {
        let opts = &self.options;
        let (accent, band) = if selection.is_gain() {
            (opts.gain_color.as_str(), opts.gain_band.as_str())
        } else {
            (opts.loss_color.as_str(), opts.loss_band.as_str())
        };

        let left = selection.start_x.min(selection.end_x);
        let right = selection.start_x.max(selection.end_x);
        painter.fill_rect(Rect::new(left, area.top, right - left, area.height()), band);

        let guide = Stroke::dashed(accent, 1.0, 4.0, 4.0);
        for x in [selection.start_x, selection.end_x] {
            painter.line((x, area.top), (x, area.bottom), &guide);
        }

        let ring = Stroke::solid(accent, 2.0);
        for center in [(selection.start_x, selection.start_y), (selection.end_x, selection.end_y)] {
            painter.circle(center, opts.handle_radius, Some("#ffffff"), Some(&ring));
            painter.circle(center, opts.handle_radius * 0.4, Some(accent), None);
        }

        let primary = selection.summary_line();
        let secondary = selection.range_line();
        let primary_style = TextStyle::new(accent, opts.label_font_size).bold().centered();
        let secondary_style =
            TextStyle::new(&opts.label_secondary_color, opts.label_font_size - 1.0).centered();

        let text_width = painter
            .measure_text(&primary, &primary_style)
            .max(painter.measure_text(&secondary, &secondary_style));
        let line_gap = 4.0;
        let box_width = text_width + opts.label_padding * 2.0;
        let box_height =
            opts.label_padding * 2.0 + primary_style.size + line_gap + secondary_style.size;

        let box_left = area.clamp_box_left((left + right) / 2.0, box_width);
        // the hover tooltip owns the top edge while visible
        let box_top = if tooltip_visible {
            area.bottom - box_height - opts.label_margin
        } else {
            area.top + opts.label_margin
        };

        painter.rounded_rect(
            Rect::new(box_left, box_top, box_width, box_height),
            6.0,
            &opts.label_background,
            Some(&Stroke::solid(accent, 1.0)),
        );
        let center_x = box_left + box_width / 2.0;
        let primary_baseline = box_top + opts.label_padding + primary_style.size;
        painter.text(&primary, center_x, primary_baseline, &primary_style);
        painter.text(
            &secondary,
            center_x,
            primary_baseline + line_gap + secondary_style.size,
            &secondary_style,
        );
    }
}

impl ChartPlugin for DragRangePlugin {
    fn id(&self) -> &'static str {
        DRAG_RANGE_PLUGIN_ID
    }

    fn on_event(&mut self, chart: &dyn ChartView, event: &PointerEvent) {
        if chart.data_len() == 0 {
            self.cancel();
            return;
        }
        match event.phase {
            PointerPhase::Down => self.begin(chart, event),
            PointerPhase::Move => self.track(chart, event),
            PointerPhase::Up | PointerPhase::Cancel | PointerPhase::Leave => self.cancel(),
        }
    }

    fn after_draw(&mut self, chart: &dyn ChartView, painter: &mut dyn Painter) {
        if chart.data_len() == 0 {
            self.cancel();
            return;
        }
        let Some((anchor, current)) = self.state.span() else {
            return;
        };
        if anchor == current {
            return;
        }
        let area = chart.plot_area();
        if !area.is_valid() {
            return;
        }
        if let Some(selection) = build_selection(chart, anchor, current) {
            self.paint(&selection, area, chart.active_tooltip().is_some(), painter);
        }
    }

    fn reset(&mut self) {
        self.cancel();
    }
}

/// Selection between two indices in chronological order. `None` when either
/// end cannot be resolved to a finite price or pixel.
pub fn build_selection(chart: &dyn ChartView, a: usize, b: usize) -> Option<DragSelection> {
    let len = chart.data_len();
    if len == 0 {
        return None;
    }
    let last = len - 1;
    let start_index = a.min(b).min(last);
    let end_index = a.max(b).min(last);

    let start_price = chart.price_at(start_index).filter(|p| p.is_finite())?;
    let end_price = chart.price_at(end_index).filter(|p| p.is_finite())?;

    let delta = end_price - start_price;
    let delta_percent = if start_price == 0.0 {
        0.0
    } else {
        delta / start_price * 100.0
    };

    let coords = [
        chart.pixel_for_index(start_index),
        chart.pixel_for_price(start_price),
        chart.pixel_for_index(end_index),
        chart.pixel_for_price(end_price),
    ];
    if !coords.iter().all(|c| c.is_finite()) {
        return None;
    }

    Some(DragSelection {
        start_index,
        end_index,
        start_label: chart.label_at(start_index).unwrap_or_default().to_string(),
        end_label: chart.label_at(end_index).unwrap_or_default().to_string(),
        start_price,
        end_price,
        delta,
        delta_percent,
        start_x: coords[0],
        start_y: coords[1],
        end_x: coords[2],
        end_y: coords[3],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::line_chart::LineChart;
    use crate::chart::surface::testing::{DrawOp, RecordingPainter};
    use crate::domain::models::HistoryPoint;
    use std::sync::{Arc, Mutex};

    type Emitted = Arc<Mutex<Vec<Option<DragSelection>>>>;

    fn chart_with(prices: &[f64]) -> (LineChart, Emitted) {
        let emitted: Emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = emitted.clone();
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        chart.register(Box::new(DragRangePlugin::new(Box::new(move |selection| {
            sink.lock().unwrap().push(selection.cloned());
        }))));
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| HistoryPoint::new(&format!("0{} Mar", i + 1), *p, 1000.0))
            .collect();
        chart.set_data(points);
        (chart, emitted)
    }

    fn emitted(events: &Emitted) -> Vec<Option<DragSelection>> {
        events.lock().unwrap().clone()
    }

    #[test]
    fn drag_emits_delta_between_points() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(100.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));

        let events = emitted(&events);
        assert_eq!(events.len(), 1);
        let selection = events[0].as_ref().expect("selection");
        assert_eq!(selection.start_index, 1);
        assert_eq!(selection.end_index, 3);
        assert_eq!(selection.start_price, 102.0);
        assert_eq!(selection.end_price, 105.0);
        assert!((selection.delta - 3.0).abs() < 1e-9);
        assert!((selection.delta_percent - 2.941176).abs() < 1e-4);
        assert_eq!(selection.summary_line(), "+3.00 (+2.94%)");
        assert_eq!(selection.range_line(), "02 Mar - 04 Mar");
    }

    #[test]
    fn zero_width_selection_is_not_emitted() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(100.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(110.0, 50.0, 1));

        assert!(emitted(&events).is_empty());
    }

    #[test]
    fn repeated_moves_emit_once() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(200.0, 50.0, 1));
        chart.handle_event(&PointerEvent::mouse_move(205.0, 50.0, 1));
        chart.handle_event(&PointerEvent::mouse_move(195.0, 50.0, 1));

        assert_eq!(emitted(&events).len(), 1);
    }

    #[test]
    fn collapsing_back_to_anchor_clears_selection() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(200.0, 50.0, 1));
        chart.handle_event(&PointerEvent::mouse_move(0.0, 50.0, 1));

        let events = emitted(&events);
        assert_eq!(events.len(), 2);
        assert!(events[1].is_none());
    }

    #[test]
    fn release_clears_exactly_once() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));
        chart.handle_event(&PointerEvent::mouse_up(300.0, 50.0));
        chart.handle_event(&PointerEvent::leave());

        let events = emitted(&events);
        assert_eq!(events.len(), 2);
        assert!(events[0].is_some());
        assert!(events[1].is_none());
    }

    #[test]
    fn move_without_button_cancels() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));
        chart.handle_event(&PointerEvent::mouse_move(200.0, 50.0, 0));

        let events = emitted(&events);
        assert_eq!(events.len(), 2);
        assert!(events[1].is_none());
    }

    #[test]
    fn touch_drag_and_cancel() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::touch_start(300.0, 50.0));
        chart.handle_event(&PointerEvent::touch_move(200.0, 50.0));
        chart.handle_event(&PointerEvent::touch_cancel());

        let events = emitted(&events);
        assert_eq!(events.len(), 2);
        let selection = events[0].as_ref().expect("selection");
        assert_eq!((selection.start_index, selection.end_index), (2, 3));
        assert!((selection.delta - 7.0).abs() < 1e-9);
        assert!(events[1].is_none());
    }

    #[test]
    fn press_outside_plot_or_secondary_button_is_ignored() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(100.0, 140.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));
        chart.handle_event(&PointerEvent::mouse_down(100.0, 50.0, 2));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));

        assert!(emitted(&events).is_empty());
    }

    #[test]
    fn new_data_clears_active_selection() {
        let (mut chart, events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);

        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));
        chart.set_data(vec![HistoryPoint::new("10:00", 50.0, 1.0)]);

        let events = emitted(&events);
        assert_eq!(events.len(), 2);
        assert!(events[1].is_none());

        let mut painter = RecordingPainter::default();
        chart.draw(&mut painter);
        assert!(!painter.draws_anything());
    }

    #[test]
    fn non_finite_price_skips_emission() {
        let (mut chart, events) = chart_with(&[100.0, f64::NAN, 98.0]);

        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(150.0, 50.0, 1));
        assert!(emitted(&events).is_empty());

        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));
        assert_eq!(emitted(&events).len(), 1);
    }

    #[test]
    fn empty_dataset_never_draws_or_emits() {
        let (mut chart, events) = chart_with(&[]);
        let mut painter = RecordingPainter::default();

        chart.handle_event(&PointerEvent::mouse_down(100.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(f64::INFINITY, 50.0, 1));
        chart.draw(&mut painter);

        assert!(emitted(&events).is_empty());
        assert!(!painter.draws_anything());
    }

    #[test]
    fn paints_band_guides_handles_and_label() {
        let (mut chart, _events) = chart_with(&[100.0, 102.0, 98.0, 105.0]);
        chart.handle_event(&PointerEvent::mouse_down(100.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(300.0, 50.0, 1));

        let mut painter = RecordingPainter::default();
        chart.draw(&mut painter);

        let band = painter.ops.iter().find_map(|op| match op {
            DrawOp::FillRect { rect, color } => Some((*rect, color.clone())),
            _ => None,
        });
        let (rect, color) = band.expect("band");
        assert_eq!(rect, Rect::new(100.0, 0.0, 200.0, 100.0));
        assert_eq!(color, DragRangeOptions::default().gain_band);
        assert_eq!(painter.dashed_lines(), 2);
        let handles = painter
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { .. }))
            .count();
        assert_eq!(handles, 4);
        assert_eq!(
            painter.texts(),
            vec!["+3.00 (+2.94%)".to_string(), "02 Mar - 04 Mar".to_string()]
        );

        let label = painter.rounded_rects()[0];
        assert!(label.x >= 0.0 && label.x + label.width <= 300.0);
        // tooltip is active from the move, so the label sits at the bottom:
        // 100 - (2 * 8 padding + 12 + 4 gap + 11) - 8 margin
        assert_eq!(label.y, 49.0);
        assert_eq!(label.y + label.height, 92.0);
    }

    #[test]
    fn label_sits_at_top_without_tooltip() {
        let (mut chart, _events) = chart_with(&[100.0, 90.0, 98.0, 105.0]);
        chart.handle_event(&PointerEvent::mouse_down(0.0, 50.0, 0));
        chart.handle_event(&PointerEvent::mouse_move(100.0, 50.0, 1));
        // dragging off the bottom edge hides the tooltip but keeps the drag
        chart.handle_event(&PointerEvent::mouse_move(100.0, 150.0, 1));

        let mut painter = RecordingPainter::default();
        chart.draw(&mut painter);

        let label = painter.rounded_rects()[0];
        assert_eq!(label.y, 8.0);
        assert_eq!(painter.texts()[0], "-10.00 (-10.00%)");
    }
}
