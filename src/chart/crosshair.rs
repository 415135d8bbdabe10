// src/chart/crosshair.rs
// Vertical hover line with the axis label pinned under the plot

use super::surface::{ChartView, Painter, Rect, Stroke, TextStyle};
use super::ChartPlugin;

pub const HOVER_CROSSHAIR_PLUGIN_ID: &str = "hover-crosshair";

#[derive(Debug, Clone, PartialEq)]
pub struct CrosshairOptions {
    pub line_color: String,
    pub label_background: String,
    pub label_color: String,
    pub font_size: f64,
    pub padding: f64,
    /// How far the line runs past the bottom of the plot.
    pub overhang: f64,
}

impl Default for CrosshairOptions {
    fn default() -> Self {
        Self {
            line_color: "rgba(100, 116, 139, 0.8)".to_string(),
            label_background: "#1e293b".to_string(),
            label_color: "#ffffff".to_string(),
            font_size: 11.0,
            padding: 4.0,
            overhang: 6.0,
        }
    }
}

/// Stateless: draws from the chart's own tooltip on every redraw.
#[derive(Debug, Clone, Default)]
pub struct HoverCrosshairPlugin {
    options: CrosshairOptions,
}

impl ChartPlugin for HoverCrosshairPlugin {
    fn id(&self) -> &'static str {
        HOVER_CROSSHAIR_PLUGIN_ID
    }

    fn after_draw(&mut self, chart: &dyn ChartView, painter: &mut dyn Painter) {
        if chart.data_len() == 0 {
            return;
        }
        let Some(tooltip) = chart.active_tooltip() else {
            return;
        };
        let area = chart.plot_area();
        if !area.is_valid() || !tooltip.x.is_finite() {
            return;
        }

        let opts = &self.options;
        let x = area.clamp_x(tooltip.x);
        let line_bottom = area.bottom + opts.overhang;
        painter.line((x, area.top), (x, line_bottom), &Stroke::solid(&opts.line_color, 1.0));

        let Some(label) = chart.label_at(tooltip.index).filter(|l| !l.is_empty()) else {
            return;
        };
        let style = TextStyle::new(&opts.label_color, opts.font_size).centered();
        let width = painter.measure_text(label, &style) + opts.padding * 2.0;
        let height = opts.font_size + opts.padding * 2.0;
        let left = area.clamp_box_left(x, width);

        painter.fill_rect(Rect::new(left, line_bottom, width, height), &opts.label_background);
        painter.text(
            label,
            left + width / 2.0,
            line_bottom + opts.padding + opts.font_size,
            &style,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::line_chart::LineChart;
    use crate::chart::surface::testing::{DrawOp, RecordingPainter};
    use crate::chart::surface::{PlotArea, TextAlign};
    use crate::chart::PointerEvent;
    use crate::domain::models::HistoryPoint;

    fn chart() -> LineChart {
        let mut chart = LineChart::new(PlotArea::new(0.0, 0.0, 300.0, 100.0));
        chart.register(Box::new(HoverCrosshairPlugin::default()));
        chart.set_data(vec![
            HistoryPoint::new("09:15", 100.0, 10.0),
            HistoryPoint::new("09:30", 101.0, 10.0),
            HistoryPoint::new("09:45", 99.0, 10.0),
        ]);
        chart
    }

    #[test]
    fn draws_line_and_label_under_hovered_point() {
        let mut chart = chart();
        chart.handle_event(&PointerEvent::mouse_move(160.0, 40.0, 0));

        let mut painter = RecordingPainter::default();
        chart.draw(&mut painter);

        assert!(painter.ops.contains(&DrawOp::Line {
            from: (150.0, 0.0),
            to: (150.0, 106.0),
            stroke: Stroke::solid(&CrosshairOptions::default().line_color, 1.0),
        }));
        assert_eq!(painter.texts(), vec!["09:30".to_string()]);
    }

    #[test]
    fn label_is_clamped_to_plot_edge() {
        let mut chart = chart();
        chart.handle_event(&PointerEvent::mouse_move(299.0, 40.0, 0));

        let mut painter = RecordingPainter::default();
        chart.draw(&mut painter);

        let label = painter.ops.iter().find_map(|op| match op {
            DrawOp::FillRect { rect, .. } => Some(*rect),
            _ => None,
        });
        let rect = label.expect("label box");
        assert!((rect.x + rect.width - 300.0).abs() < 1e-9);

        let anchor = painter.ops.iter().find_map(|op| match op {
            DrawOp::Text { x, align, .. } => Some((*x, *align)),
            _ => None,
        });
        assert_eq!(anchor, Some((rect.x + rect.width / 2.0, TextAlign::Center)));
    }

    #[test]
    fn nothing_without_hover() {
        let mut chart = chart();
        let mut painter = RecordingPainter::default();
        chart.handle_event(&PointerEvent::mouse_move(160.0, 40.0, 0));
        chart.handle_event(&PointerEvent::leave());
        chart.draw(&mut painter);

        assert!(!painter
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Line { .. } | DrawOp::Text { .. })));
    }
}
