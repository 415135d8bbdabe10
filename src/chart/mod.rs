// src/chart/mod.rs
// Price chart surface and the interaction plugins layered on it

pub mod crosshair;
pub mod drag_range;
pub mod line_chart;
pub mod surface;

pub use crosshair::{CrosshairOptions, HoverCrosshairPlugin};
pub use drag_range::{DragRangeOptions, DragRangePlugin, RangeCallback};
pub use line_chart::LineChart;
pub use surface::{ChartView, Painter, PlotArea, Rect, Stroke, TextAlign, TextStyle, TooltipPoint};

/// Bit set in `buttons` while the primary mouse button is held.
pub const PRIMARY_BUTTON_MASK: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

/// Raw input delivered to the chart canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub source: PointerSource,
    pub x: f64,
    pub y: f64,
    /// Button that changed state (mouse down/up only)
    pub button: i16,
    /// Buttons currently held
    pub buttons: u16,
}

impl PointerEvent {
    fn mouse(phase: PointerPhase, x: f64, y: f64, button: i16, buttons: u16) -> Self {
        Self {
            phase,
            source: PointerSource::Mouse,
            x,
            y,
            button,
            buttons,
        }
    }

    fn touch(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            source: PointerSource::Touch,
            x,
            y,
            button: 0,
            buttons: 0,
        }
    }

    pub fn mouse_down(x: f64, y: f64, button: i16) -> Self {
        Self::mouse(PointerPhase::Down, x, y, button, PRIMARY_BUTTON_MASK)
    }

    pub fn mouse_move(x: f64, y: f64, buttons: u16) -> Self {
        Self::mouse(PointerPhase::Move, x, y, 0, buttons)
    }

    pub fn mouse_up(x: f64, y: f64) -> Self {
        Self::mouse(PointerPhase::Up, x, y, 0, 0)
    }

    pub fn leave() -> Self {
        Self::mouse(PointerPhase::Leave, f64::NAN, f64::NAN, 0, 0)
    }

    pub fn touch_start(x: f64, y: f64) -> Self {
        Self::touch(PointerPhase::Down, x, y)
    }

    pub fn touch_move(x: f64, y: f64) -> Self {
        Self::touch(PointerPhase::Move, x, y)
    }

    pub fn touch_end(x: f64, y: f64) -> Self {
        Self::touch(PointerPhase::Up, x, y)
    }

    pub fn touch_cancel() -> Self {
        Self::touch(PointerPhase::Cancel, f64::NAN, f64::NAN)
    }

    /// Primary mouse button press, or any touch start.
    pub fn is_primary_press(&self) -> bool {
        match self.source {
            PointerSource::Mouse => self.button == 0,
            PointerSource::Touch => true,
        }
    }

    /// Whether the pointer is still pressed while moving.
    pub fn is_pressed(&self) -> bool {
        match self.source {
            PointerSource::Mouse => self.buttons & PRIMARY_BUTTON_MASK != 0,
            PointerSource::Touch => true,
        }
    }
}

/// Hooks a chart calls on its registered plugins.
pub trait ChartPlugin: Send {
    fn id(&self) -> &'static str;

    fn on_event(&mut self, _chart: &dyn ChartView, _event: &PointerEvent) {}

    /// Runs after the series is painted, on every redraw.
    fn after_draw(&mut self, _chart: &dyn ChartView, _painter: &mut dyn Painter) {}

    /// Data or context changed underneath the plugin.
    fn reset(&mut self) {}
}

/// Nearest data index under a horizontal pixel position.
pub fn resolve_index(chart: &dyn ChartView, x: f64) -> Option<usize> {
    let len = chart.data_len();
    if len == 0 {
        return None;
    }
    let area = chart.plot_area();
    if !area.is_valid() {
        return None;
    }

    let value = chart.value_for_pixel(area.clamp_x(x));
    if !value.is_finite() {
        return None;
    }
    let max = (len - 1) as f64;
    Some(value.round().max(0.0).min(max) as usize)
}
