// src/chart/surface.rs
// Rendering surface seams: coordinate transforms and drawing primitives

/// Pixel bounds of the plotted region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn is_valid(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn clamp_x(&self, x: f64) -> f64 {
        if x.is_nan() {
            return self.left;
        }
        x.max(self.left).min(self.right)
    }

    /// Left edge of a box of `width` centred on `center_x`, kept inside the
    /// horizontal bounds where it fits.
    pub fn clamp_box_left(&self, center_x: f64, width: f64) -> f64 {
        let left = center_x - width / 2.0;
        let max_left = self.right - width;
        if max_left < self.left {
            return self.left;
        }
        left.max(self.left).min(max_left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Point the chart's own hover tooltip is showing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPoint {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Read side of a rendered line chart.
pub trait ChartView {
    fn plot_area(&self) -> PlotArea;

    fn data_len(&self) -> usize;

    /// Category-axis value under a horizontal pixel position.
    fn value_for_pixel(&self, x: f64) -> f64;

    fn pixel_for_index(&self, index: usize) -> f64;

    fn pixel_for_price(&self, price: f64) -> f64;

    fn price_at(&self, index: usize) -> Option<f64>;

    fn label_at(&self, index: usize) -> Option<&str>;

    fn active_tooltip(&self) -> Option<TooltipPoint>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub fn solid(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: None,
        }
    }

    pub fn dashed(color: &str, width: f64, on: f64, off: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: Some((on, off)),
        }
    }
}

/// Which point of the text `x` anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: String,
    pub size: f64,
    pub bold: bool,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn new(color: &str, size: f64) -> Self {
        Self {
            color: color.to_string(),
            size,
            bold: false,
            align: TextAlign::Left,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }
}

/// Write side: a 2D drawing context such as a canvas.
pub trait Painter {
    fn save(&mut self);
    fn restore(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: &str);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke);
    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke);
    fn circle(&mut self, center: (f64, f64), radius: f64, fill: Option<&str>, stroke: Option<&Stroke>);
    fn rounded_rect(&mut self, rect: Rect, radius: f64, fill: &str, stroke: Option<&Stroke>);
    /// `y` is the text baseline.
    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);
    fn measure_text(&self, text: &str, style: &TextStyle) -> f64;
}
