//! Renderer-agnostic chart primitives.
//!
//! Coordinates are in chart units with the origin at the top-left corner and
//! `y` growing downwards.

use serde::Serialize;

use crate::route::{ImpactCategory, SectorImpact};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axes {
    pub time_axis: Segment,
    pub year_axis: Segment,
    /// Horizontal gridline positions, fastest first.
    pub time_ticks: Vec<Tick>,
    pub year_ticks: Vec<Tick>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Mean,
    /// Interpolated between p25 and the fastest time; not a true percentile.
    P10Proxy,
    Fastest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub point: Point,
    pub minutes: f64,
    pub label: String,
    pub clipped: bool,
}

/// Box-plot primitives for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGeometry {
    pub year: i32,
    pub count: u32,
    pub center_x: f64,
    /// Spans p25 (top edge) to p75 (bottom edge).
    pub iqr: Rect,
    pub median: Segment,
    pub median_label: String,
    /// From the p25 edge up to the fastest time.
    pub whisker: Segment,
    pub mean: Marker,
    pub p10_proxy: Marker,
    pub fastest: Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    /// Classified against the route profile.
    Directional,
    /// No route or no direction: wind speed only, neutral hue.
    IntensityOnly,
}

/// Translucent band behind a year's box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayBand {
    pub year: i32,
    pub rect: Rect,
    pub mode: OverlayMode,
    /// Opacity in `[0, 0.4]`.
    pub intensity: f64,
    pub category: ImpactCategory,
    pub score: Option<f64>,
    pub wind_speed: f64,
    pub wind_direction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindAnnotation {
    pub year: i32,
    pub anchor: Point,
    pub label: String,
    /// Arrow rotation in degrees clockwise from north.
    pub wind_direction: Option<f64>,
    pub category: Option<ImpactCategory>,
}

/// A selected rider's own result in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightMarker {
    pub year: i32,
    pub point: Point,
    pub minutes: f64,
    pub time_formatted: String,
    pub place: u32,
    pub clipped: bool,
}

/// Everything a renderer needs for one chart. Rebuilt from scratch per render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub plot: Rect,
    pub start_year: i32,
    pub end_year: i32,
    pub years: Vec<i32>,
    pub axes: Axes,
    pub boxes: Vec<BoxGeometry>,
    pub overlay: Vec<OverlayBand>,
    pub wind_annotations: Vec<WindAnnotation>,
    pub trend_path: Vec<Point>,
    pub highlighted_rider: Option<String>,
    pub highlights: Vec<HighlightMarker>,
    pub legend: Vec<SectorImpact>,
}

impl ChartGeometry {
    /// True when no year falls inside the requested range.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
