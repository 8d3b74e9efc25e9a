//! Turns per-year statistics into positioned chart primitives.
//!
//! A render runs a fixed sequence of pure stages:
//! [`configure`] → [`resolve_scales`] → [`layout_axes`] → [`layout_boxes`] →
//! [`layout_overlay`] → [`layout_trend_path`] → [`layout_highlights`].
//! No stage mutates shared state and nothing is patched incrementally.
//!
//! Input statistics must be sorted ascending by year.

pub mod geometry;
pub mod scale;

use tracing::debug;

use crate::config::{LayoutConfig, MIN_TICK_STEP_MINUTES};
use crate::dataset::{
    LocationWeather, RiderRecord, WeatherSummary, YearStatistics, format_minutes, years_in_range,
};
use crate::route::{DirectionalProfile, ImpactCategory};
pub use geometry::*;
pub use scale::{MAX_TIME_BOUND, MIN_TIME_BOUND, Scales, TimeScale, YearScale, resolve_scales};

/// Band opacity cap when the band is classified against the route.
pub const DIRECTIONAL_MAX_INTENSITY: f64 = 0.4;
/// Wind speed divisor for classified bands.
pub const DIRECTIONAL_SPEED_DIVISOR: f64 = 30.0;
/// Band opacity cap for intensity-only bands.
pub const FALLBACK_MAX_INTENSITY: f64 = 0.3;
/// Wind speed divisor for intensity-only bands.
pub const FALLBACK_SPEED_DIVISOR: f64 = 40.0;

/// Weight of the gap between p25 and the fastest time used for the p10 proxy.
const P10_PROXY_FACTOR: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_wind_overlay: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_wind_overlay: true,
        }
    }
}

/// Read-only inputs of one render.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    pub years: &'a [YearStatistics],
    pub weather: &'a [WeatherSummary],
    pub profile: Option<&'a DirectionalProfile>,
    pub rider: Option<&'a RiderRecord>,
}

/// Years inside `[start_year, end_year]`, in input order.
pub fn configure(years: &[YearStatistics], start_year: i32, end_year: i32) -> Vec<&YearStatistics> {
    years_in_range(years, start_year, end_year)
}

/// Gridlines from 40 to 100 minutes, generated by index so they never drift.
///
/// Steps below [`MIN_TICK_STEP_MINUTES`] (or NaN) are raised to it. Whole
/// minute steps are labelled `"50"`, fractional ones `"42:30"`.
fn time_ticks(time: &TimeScale, step: f64) -> Vec<Tick> {
    let step = step.max(MIN_TICK_STEP_MINUTES);
    let whole = step.fract() == 0.0;
    let count = ((MAX_TIME_BOUND - MIN_TIME_BOUND) / step + 1e-9).floor() as usize;

    (0..=count)
        .map(|k| {
            let value = MIN_TIME_BOUND + k as f64 * step;
            Tick {
                value,
                position: time.position(value),
                label: if whole {
                    format!("{value:.0}")
                } else {
                    format_minutes(value)
                },
            }
        })
        .collect()
}

pub fn layout_axes(config: &LayoutConfig, scales: &Scales, visible: &[&YearStatistics]) -> Axes {
    let time = &scales.time;
    let left = scales.year.left;
    let right = left + scales.year.plot_width;

    let time_ticks = time_ticks(time, config.tick_step_minutes);

    let year_ticks = visible
        .iter()
        .enumerate()
        .map(|(i, y)| Tick {
            value: f64::from(y.year),
            position: scales.year.position(i),
            label: y.year.to_string(),
        })
        .collect();

    Axes {
        time_axis: Segment {
            from: Point { x: left, y: time.top },
            to: Point {
                x: left,
                y: time.bottom(),
            },
        },
        year_axis: Segment {
            from: Point {
                x: left,
                y: time.bottom(),
            },
            to: Point {
                x: right,
                y: time.bottom(),
            },
        },
        time_ticks,
        year_ticks,
    }
}

fn marker(scale: &TimeScale, kind: MarkerKind, x: f64, minutes: f64, label: String) -> Marker {
    let (y, clipped) = scale.clamped(minutes);
    Marker {
        kind,
        point: Point { x, y },
        minutes,
        label,
        clipped,
    }
}

/// p25 pulled 60% of the way towards the fastest time.
pub fn p10_proxy(p25: f64, min: f64) -> f64 {
    p25 - (p25 - min) * P10_PROXY_FACTOR
}

pub fn layout_boxes(config: &LayoutConfig, scales: &Scales, visible: &[&YearStatistics]) -> Vec<BoxGeometry> {
    let time = &scales.time;
    let box_width = scales.year.slot_width() * config.box_width_ratio;

    visible
        .iter()
        .enumerate()
        .map(|(i, y)| {
            let t = &y.times;
            let fmt = &y.times_formatted;
            let x = scales.year.position(i);
            let half = box_width / 2.0;

            let (p25_y, _) = time.clamped(t.p25);
            let (p75_y, _) = time.clamped(t.p75);
            let (median_y, _) = time.clamped(t.median);
            let (min_y, _) = time.clamped(t.min);

            let proxy = p10_proxy(t.p25, t.min);

            BoxGeometry {
                year: y.year,
                count: y.count,
                center_x: x,
                iqr: Rect {
                    x: x - half,
                    y: p25_y.min(p75_y),
                    width: box_width,
                    height: (p75_y - p25_y).abs(),
                },
                median: Segment {
                    from: Point {
                        x: x - half,
                        y: median_y,
                    },
                    to: Point {
                        x: x + half,
                        y: median_y,
                    },
                },
                median_label: fmt.median.clone().unwrap_or_else(|| format_minutes(t.median)),
                whisker: Segment {
                    from: Point { x, y: p25_y },
                    to: Point { x, y: min_y },
                },
                mean: marker(
                    time,
                    MarkerKind::Mean,
                    x,
                    t.mean,
                    fmt.mean.clone().unwrap_or_else(|| format_minutes(t.mean)),
                ),
                p10_proxy: marker(time, MarkerKind::P10Proxy, x, proxy, format_minutes(proxy)),
                fastest: marker(
                    time,
                    MarkerKind::Fastest,
                    x,
                    t.min,
                    fmt.min.clone().unwrap_or_else(|| format_minutes(t.min)),
                ),
            }
        })
        .collect()
}

/// Station used for a year's overlay.
///
/// A station with both speed and direction wins, summit first. Failing
/// that, any station with a speed, summit first.
fn overlay_station(weather: &WeatherSummary) -> Option<&LocationWeather> {
    let stations = [&weather.summit, &weather.start];
    stations
        .iter()
        .find(|s| s.wind_speed_avg.is_some() && s.wind_direction_avg.is_some())
        .or_else(|| stations.iter().find(|s| s.wind_speed_avg.is_some()))
        .copied()
}

/// Intensity and category for one year's wind.
///
/// With a profile and a direction the band is classified and scaled by
/// `min(0.4, speed / 30)`; otherwise it is neutral and scaled by
/// `min(0.3, speed / 40)`.
pub fn band_style(
    profile: Option<&DirectionalProfile>,
    wind_speed: f64,
    wind_direction: Option<f64>,
) -> (OverlayMode, f64, ImpactCategory, Option<f64>) {
    match (profile, wind_direction) {
        (Some(profile), Some(direction)) => {
            let impact = profile.classify_wind_impact(direction);
            (
                OverlayMode::Directional,
                DIRECTIONAL_MAX_INTENSITY.min(wind_speed / DIRECTIONAL_SPEED_DIVISOR),
                impact.category,
                Some(impact.score),
            )
        }
        _ => (
            OverlayMode::IntensityOnly,
            FALLBACK_MAX_INTENSITY.min(wind_speed / FALLBACK_SPEED_DIVISOR),
            ImpactCategory::Neutral,
            None,
        ),
    }
}

/// Overlay bands and wind annotations. Years without weather get neither.
pub fn layout_overlay(
    scales: &Scales,
    visible: &[&YearStatistics],
    weather: &[WeatherSummary],
    profile: Option<&DirectionalProfile>,
) -> (Vec<OverlayBand>, Vec<WindAnnotation>) {
    let time = &scales.time;
    let slot = scales.year.slot_width();
    let mut bands = Vec::new();
    let mut annotations = Vec::new();

    for (i, y) in visible.iter().enumerate() {
        let Some(station) = weather
            .iter()
            .find(|w| w.year == y.year)
            .and_then(overlay_station)
        else {
            continue;
        };
        let wind_speed = station.wind_speed_avg.unwrap_or(0.0);
        let wind_direction = station.wind_direction_avg;
        let (mode, intensity, category, score) = band_style(profile, wind_speed, wind_direction);
        let x = scales.year.position(i);

        bands.push(OverlayBand {
            year: y.year,
            rect: Rect {
                x: x - slot / 2.0,
                y: time.top,
                width: slot,
                height: time.plot_height,
            },
            mode,
            intensity,
            category,
            score,
            wind_speed,
            wind_direction,
        });

        annotations.push(WindAnnotation {
            year: y.year,
            anchor: Point {
                x,
                y: time.top / 2.0,
            },
            label: format!("{wind_speed:.1} mph"),
            wind_direction,
            category: (mode == OverlayMode::Directional).then_some(category),
        });
    }

    (bands, annotations)
}

/// Median points in year order.
pub fn layout_trend_path(scales: &Scales, visible: &[&YearStatistics]) -> Vec<Point> {
    visible
        .iter()
        .enumerate()
        .map(|(i, y)| Point {
            x: scales.year.position(i),
            y: scales.time.clamped(y.times.median).0,
        })
        .collect()
}

/// One marker per visible year the rider finished, at the rider's own time.
pub fn layout_highlights(
    scales: &Scales,
    visible: &[&YearStatistics],
    rider: Option<&RiderRecord>,
) -> Vec<HighlightMarker> {
    let Some(rider) = rider else {
        return Vec::new();
    };

    visible
        .iter()
        .enumerate()
        .filter_map(|(i, y)| {
            let performance = rider.performance_in(y.year)?;
            let minutes = performance.time_minutes();
            let (py, clipped) = scales.time.clamped(minutes);
            Some(HighlightMarker {
                year: y.year,
                point: Point {
                    x: scales.year.position(i),
                    y: py,
                },
                minutes,
                time_formatted: performance
                    .time_formatted
                    .clone()
                    .unwrap_or_else(|| format_minutes(minutes)),
                place: performance.place,
                clipped,
            })
        })
        .collect()
}

/// Runs every stage for `[start_year, end_year]`.
///
/// An empty range yields a valid geometry with empty per-year layers.
pub fn render(
    config: &LayoutConfig,
    input: LayoutInput<'_>,
    start_year: i32,
    end_year: i32,
    options: RenderOptions,
) -> ChartGeometry {
    let visible = configure(input.years, start_year, end_year);
    let scales = resolve_scales(config, visible.len());
    let axes = layout_axes(config, &scales, &visible);
    let boxes = layout_boxes(config, &scales, &visible);
    let (overlay, wind_annotations) = if options.show_wind_overlay {
        layout_overlay(&scales, &visible, input.weather, input.profile)
    } else {
        (Vec::new(), Vec::new())
    };
    let trend_path = layout_trend_path(&scales, &visible);
    let highlights = layout_highlights(&scales, &visible, input.rider);

    debug!(
        start_year,
        end_year,
        visible = visible.len(),
        bands = overlay.len(),
        highlights = highlights.len(),
        "Chart laid out"
    );

    ChartGeometry {
        width: config.width,
        height: config.height,
        plot: Rect {
            x: scales.year.left,
            y: scales.time.top,
            width: scales.year.plot_width,
            height: scales.time.plot_height,
        },
        start_year,
        end_year,
        years: visible.iter().map(|y| y.year).collect(),
        axes,
        boxes,
        overlay,
        wind_annotations,
        trend_path,
        highlighted_rider: input.rider.map(|r| r.name.clone()),
        highlights,
        legend: input.profile.map(|p| p.wind_legend()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Performance, TimeSummary};
    use crate::geo::RoutePoint;

    fn year(year: i32, min: f64, p25: f64, median: f64, mean: f64, p75: f64) -> YearStatistics {
        YearStatistics {
            year,
            count: 250,
            times: TimeSummary {
                min,
                p25,
                median,
                mean,
                p75,
                max: None,
            },
            ..Default::default()
        }
    }

    fn years() -> Vec<YearStatistics> {
        vec![
            year(2021, 48.0, 60.0, 66.0, 67.0, 74.0),
            year(2022, 47.0, 58.0, 64.0, 65.5, 72.0),
            year(2023, 50.0, 62.0, 69.0, 70.0, 78.0),
        ]
    }

    fn weather(year: i32, speed: f64, direction: Option<f64>) -> WeatherSummary {
        WeatherSummary {
            year,
            summit: LocationWeather {
                wind_speed_avg: Some(speed),
                wind_direction_avg: direction,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn northbound() -> DirectionalProfile {
        let points = [
            RoutePoint::new(37.0, -122.0),
            RoutePoint::new(37.01, -122.0),
            RoutePoint::new(37.02, -122.0),
        ];
        DirectionalProfile::build(&points).unwrap()
    }

    fn input<'a>(
        years: &'a [YearStatistics],
        weather: &'a [WeatherSummary],
        profile: Option<&'a DirectionalProfile>,
        rider: Option<&'a RiderRecord>,
    ) -> LayoutInput<'a> {
        LayoutInput {
            years,
            weather,
            profile,
            rider,
        }
    }

    #[test]
    fn test_empty_range_yields_empty_layers() {
        let years = years();
        let config = LayoutConfig::default();
        let chart = render(&config, input(&years, &[], None, None), 2030, 2035, RenderOptions::default());

        assert!(chart.is_empty());
        assert!(chart.boxes.is_empty());
        assert!(chart.overlay.is_empty());
        assert!(chart.wind_annotations.is_empty());
        assert!(chart.trend_path.is_empty());
        assert!(chart.highlights.is_empty());
        assert!(chart.axes.year_ticks.is_empty());
        // fixed time axis is still drawn
        assert_eq!(chart.axes.time_ticks.len(), 7);
    }

    #[test]
    fn test_box_geometry_ordering() {
        let years = years();
        let config = LayoutConfig::default();
        let chart = render(&config, input(&years, &[], None, None), 2021, 2023, RenderOptions::default());

        assert_eq!(chart.boxes.len(), 3);
        for b in &chart.boxes {
            let p25_y = b.iqr.y;
            let p75_y = b.iqr.bottom();
            assert!(b.fastest.point.y < b.p10_proxy.point.y);
            assert!(b.p10_proxy.point.y < p25_y);
            assert!(p25_y < b.median.from.y);
            assert!(b.median.from.y < p75_y);
            assert_eq!(b.whisker.to.y, b.fastest.point.y);
        }
    }

    #[test]
    fn test_box_positions_follow_scale() {
        let years = years();
        let config = LayoutConfig::default();
        let scales = resolve_scales(&config, 3);
        let chart = render(&config, input(&years, &[], None, None), 2021, 2023, RenderOptions::default());
        let first = &chart.boxes[0];

        assert_eq!(first.center_x, scales.year.position(0));
        assert!((first.iqr.y - scales.time.position(60.0)).abs() < 1e-9);
        assert!((first.median.from.y - scales.time.position(66.0)).abs() < 1e-9);
        assert!((first.iqr.width - scales.year.slot_width() * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_p10_proxy_interpolation() {
        assert!((p10_proxy(60.0, 50.0) - 54.0).abs() < 1e-12);
        assert_eq!(p10_proxy(60.0, 60.0), 60.0);
    }

    #[test]
    fn test_times_outside_window_are_clipped() {
        let years = vec![year(2020, 35.0, 45.0, 60.0, 62.0, 105.0)];
        let config = LayoutConfig::default();
        let chart = render(&config, input(&years, &[], None, None), 2020, 2020, RenderOptions::default());
        let b = &chart.boxes[0];

        assert!(b.fastest.clipped);
        assert_eq!(b.fastest.point.y, chart.plot.y);
        assert!((b.iqr.bottom() - chart.plot.bottom()).abs() < 1e-9);
        assert!(!b.mean.clipped);
    }

    #[test]
    fn test_directional_overlay() {
        let years = years();
        let weather = vec![weather(2021, 15.0, Some(180.0)), weather(2022, 6.0, Some(0.0))];
        let profile = northbound();
        let config = LayoutConfig::default();
        let chart = render(
            &config,
            input(&years, &weather, Some(&profile), None),
            2021,
            2023,
            RenderOptions::default(),
        );

        assert_eq!(chart.overlay.len(), 2);
        let tail = &chart.overlay[0];
        assert_eq!(tail.mode, OverlayMode::Directional);
        assert_eq!(tail.category, ImpactCategory::Beneficial);
        assert!((tail.intensity - 0.4).abs() < 1e-12);

        let head = &chart.overlay[1];
        assert_eq!(head.category, ImpactCategory::Detrimental);
        assert!((head.intensity - 0.2).abs() < 1e-12);

        // 2023 has no weather: no band and no annotation
        assert!(chart.overlay.iter().all(|b| b.year != 2023));
        assert_eq!(chart.wind_annotations.len(), 2);
        assert_eq!(chart.wind_annotations[0].label, "15.0 mph");
        assert_eq!(chart.legend.len(), 16);
    }

    #[test]
    fn test_intensity_only_fallback() {
        let profile = northbound();

        let (mode, intensity, category, score) = band_style(None, 8.0, Some(90.0));
        assert_eq!(mode, OverlayMode::IntensityOnly);
        assert!((intensity - 0.2).abs() < 1e-12);
        assert_eq!(category, ImpactCategory::Neutral);
        assert_eq!(score, None);

        let (mode, intensity, _, _) = band_style(Some(&profile), 20.0, None);
        assert_eq!(mode, OverlayMode::IntensityOnly);
        assert!((intensity - 0.3).abs() < 1e-12);

        let (mode, intensity, _, _) = band_style(Some(&profile), 9.0, Some(90.0));
        assert_eq!(mode, OverlayMode::Directional);
        assert!((intensity - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_overlay_falls_back_to_start_station() {
        let years = years();
        let weather = vec![WeatherSummary {
            year: 2022,
            start: LocationWeather {
                wind_speed_avg: Some(4.0),
                ..Default::default()
            },
            ..Default::default()
        }];
        let config = LayoutConfig::default();
        let chart = render(&config, input(&years, &weather, None, None), 2021, 2023, RenderOptions::default());

        assert_eq!(chart.overlay.len(), 1);
        assert!((chart.overlay[0].intensity - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_overlay_toggle_off() {
        let years = years();
        let weather = vec![weather(2021, 15.0, Some(180.0))];
        let config = LayoutConfig::default();
        let options = RenderOptions {
            show_wind_overlay: false,
        };
        let chart = render(&config, input(&years, &weather, None, None), 2021, 2023, options);

        assert!(chart.overlay.is_empty());
        assert!(chart.wind_annotations.is_empty());
        assert_eq!(chart.boxes.len(), 3);
    }

    #[test]
    fn test_trend_path_follows_medians() {
        let years = years();
        let config = LayoutConfig::default();
        let chart = render(&config, input(&years, &[], None, None), 2022, 2023, RenderOptions::default());

        assert_eq!(chart.trend_path.len(), 2);
        assert_eq!(chart.trend_path[0].y, chart.boxes[0].median.from.y);
        assert!(chart.trend_path[0].x < chart.trend_path[1].x);
    }

    #[test]
    fn test_highlights_use_rider_time_and_skip_missing_years() {
        let years = years();
        let rider = RiderRecord {
            name: "Ann".to_string(),
            years_participated: 2,
            performances: vec![
                Performance {
                    year: 2021,
                    time_seconds: 3300.0,
                    place: 12,
                    time_formatted: Some("55:00".to_string()),
                    gender: None,
                    age: None,
                },
                Performance {
                    year: 2023,
                    time_seconds: 3480.0,
                    place: 15,
                    time_formatted: None,
                    gender: None,
                    age: None,
                },
            ],
        };
        let config = LayoutConfig::default();
        let scales = resolve_scales(&config, 3);
        let chart = render(
            &config,
            input(&years, &[], None, Some(&rider)),
            2021,
            2023,
            RenderOptions::default(),
        );

        assert_eq!(chart.highlighted_rider.as_deref(), Some("Ann"));
        assert_eq!(chart.highlights.len(), 2);
        assert_eq!(chart.highlights[0].year, 2021);
        assert!((chart.highlights[0].point.y - scales.time.position(55.0)).abs() < 1e-9);
        assert_eq!(chart.highlights[1].year, 2023);
        assert_eq!(chart.highlights[1].point.x, scales.year.position(2));
        assert_eq!(chart.highlights[1].time_formatted, "58:00");
    }

    #[test]
    fn test_axes_ticks() {
        let years = years();
        let config = LayoutConfig::default();
        let chart = render(&config, input(&years, &[], None, None), 2021, 2023, RenderOptions::default());
        let ticks = &chart.axes.time_ticks;

        assert_eq!(ticks.first().unwrap().label, "40");
        assert_eq!(ticks.first().unwrap().position, chart.plot.y);
        assert_eq!(ticks.last().unwrap().label, "100");
        assert_eq!(ticks.last().unwrap().position, chart.plot.bottom());
        assert_eq!(chart.axes.year_ticks[1].label, "2022");
    }

    #[test]
    fn test_fractional_tick_step() {
        let years = years();
        let config = LayoutConfig {
            tick_step_minutes: 2.5,
            ..Default::default()
        };
        let chart = render(&config, input(&years, &[], None, None), 2021, 2023, RenderOptions::default());
        let ticks = &chart.axes.time_ticks;

        assert_eq!(ticks.len(), 25);
        assert_eq!(ticks[1].value, 42.5);
        assert_eq!(ticks[1].label, "42:30");
        assert_eq!(ticks.last().unwrap().value, 100.0);
        assert_eq!(ticks.last().unwrap().position, chart.plot.bottom());
    }

    #[test]
    fn test_tiny_tick_step_is_bounded() {
        let years = years();
        // built directly, bypassing validation
        let config = LayoutConfig {
            tick_step_minutes: 1e-20,
            ..Default::default()
        };
        let chart = render(&config, input(&years, &[], None, None), 2021, 2023, RenderOptions::default());
        assert_eq!(chart.axes.time_ticks.len(), 121);

        let zero = LayoutConfig {
            tick_step_minutes: 0.0,
            ..Default::default()
        };
        let chart = render(&zero, input(&years, &[], None, None), 2021, 2023, RenderOptions::default());
        assert_eq!(chart.axes.time_ticks.len(), 121);
    }

    #[test]
    fn test_overlay_prefers_station_with_direction() {
        let years = years();
        let profile = northbound();
        let weather = vec![WeatherSummary {
            year: 2021,
            start: LocationWeather {
                wind_speed_avg: Some(6.0),
                wind_direction_avg: Some(180.0),
                ..Default::default()
            },
            summit: LocationWeather {
                wind_speed_avg: Some(12.0),
                wind_direction_avg: None,
                ..Default::default()
            },
        }];
        let chart = render(
            &LayoutConfig::default(),
            input(&years, &weather, Some(&profile), None),
            2021,
            2021,
            RenderOptions::default(),
        );
        let band = &chart.overlay[0];

        assert_eq!(band.mode, OverlayMode::Directional);
        assert_eq!(band.wind_speed, 6.0);
        assert_eq!(band.wind_direction, Some(180.0));
        assert_eq!(band.category, ImpactCategory::Beneficial);
    }

    #[test]
    fn test_overlay_falls_back_to_summit_speed() {
        let years = years();
        let profile = northbound();
        let weather = vec![WeatherSummary {
            year: 2021,
            start: LocationWeather {
                wind_speed_avg: Some(6.0),
                ..Default::default()
            },
            summit: LocationWeather {
                wind_speed_avg: Some(12.0),
                ..Default::default()
            },
        }];
        let chart = render(
            &LayoutConfig::default(),
            input(&years, &weather, Some(&profile), None),
            2021,
            2021,
            RenderOptions::default(),
        );

        assert_eq!(chart.overlay[0].mode, OverlayMode::IntensityOnly);
        assert_eq!(chart.overlay[0].wind_speed, 12.0);
    }
}
