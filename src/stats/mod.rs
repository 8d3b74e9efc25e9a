//! Year-over-year statistics, outlier ranking and wind correlation.
//!
//! Every function here takes `YearStatistics` sorted ascending by year and
//! does not re-sort. Missing inputs yield `None` or empty results, never
//! errors.

pub mod utility;
pub mod wind_label;

use serde::Serialize;

use crate::dataset::{WeatherSummary, YearStatistics, format_minutes, years_in_range};
use utility::{mean, pearson, stddev};
pub use wind_label::WindLabel;

/// Percent change of the median between consecutive years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOverYear {
    /// `pct_changes[i]` is the change from year `i` to year `i + 1`.
    pub pct_changes: Vec<f64>,
    pub last_change: f64,
    pub avg_change: f64,
    /// Population standard deviation of `pct_changes`.
    pub volatility: f64,
    pub current_year: i32,
    pub prior_year: i32,
}

/// A year ranked by how far its median sits from the overall median.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    pub year: i32,
    pub median_minutes: f64,
    pub median_formatted: String,
    pub pct_diff: f64,
    pub wind_speed: f64,
    pub wind_label: WindLabel,
}

/// Headline numbers recomputed from per-year statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceSummary {
    pub total_years: usize,
    pub year_range: String,
    /// Mean of the per-year medians.
    pub overall_median_minutes: f64,
    pub overall_median_formatted: String,
    pub fastest_year_by_median: i32,
    pub fastest_median_time: String,
    pub fastest_year_by_winner: i32,
    pub fastest_time: String,
    pub total_finishers: u64,
}

/// Start and summit wind for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindComparison {
    pub year: i32,
    pub start_avg: Option<f64>,
    pub summit_avg: Option<f64>,
    /// `summit_avg - start_avg` when both exist.
    pub summit_delta: Option<f64>,
}

/// Year-over-year change of the median finish time.
///
/// Returns `None` with fewer than two years. `current_year` and `prior_year`
/// are the last two entries by position.
pub fn year_over_year(years: &[YearStatistics]) -> Option<YearOverYear> {
    if years.len() < 2 {
        return None;
    }

    let pct_changes: Vec<f64> = years
        .windows(2)
        .map(|w| (w[1].times.median - w[0].times.median) / w[0].times.median * 100.0)
        .collect();

    let avg_change = mean(&pct_changes);
    let volatility = stddev(&pct_changes, avg_change);
    let last_change = *pct_changes.last()?;

    Some(YearOverYear {
        last_change,
        avg_change,
        volatility,
        current_year: years[years.len() - 1].year,
        prior_year: years[years.len() - 2].year,
        pct_changes,
    })
}

/// Summit average wind speed for a year, 0 when unknown.
pub fn summit_wind_speed(weather: &[WeatherSummary], year: i32) -> f64 {
    weather
        .iter()
        .find(|w| w.year == year)
        .and_then(|w| w.summit.wind_speed_avg)
        .unwrap_or(0.0)
}

/// Ranks the years in `[start_year, end_year]` by their distance from
/// `overall_median`, largest first, and keeps the first `top_n`.
///
/// Equal distances rank the slower year (above the baseline) first and
/// otherwise keep input order.
pub fn rank_outliers(
    years: &[YearStatistics],
    weather: &[WeatherSummary],
    overall_median: f64,
    start_year: i32,
    end_year: i32,
    top_n: usize,
) -> Vec<Outlier> {
    let mut outliers: Vec<Outlier> = years_in_range(years, start_year, end_year)
        .into_iter()
        .map(|y| {
            let median = y.times.median;
            let wind_speed = summit_wind_speed(weather, y.year);
            Outlier {
                year: y.year,
                median_minutes: median,
                median_formatted: y
                    .times_formatted
                    .median
                    .clone()
                    .unwrap_or_else(|| format_minutes(median)),
                pct_diff: (median - overall_median) / overall_median * 100.0,
                wind_speed,
                wind_label: WindLabel::from_speed(wind_speed),
            }
        })
        .collect();

    // sort_by is stable
    outliers.sort_by(|a, b| {
        b.pct_diff
            .abs()
            .total_cmp(&a.pct_diff.abs())
            .then_with(|| tie_rank(a, b))
    });
    outliers.truncate(top_n);
    outliers
}

/// On equal magnitude, the positive difference goes first.
fn tie_rank(a: &Outlier, b: &Outlier) -> std::cmp::Ordering {
    match (a.pct_diff > 0.0, b.pct_diff > 0.0) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => std::cmp::Ordering::Equal,
    }
}

/// Pearson correlation between median time and summit average wind speed.
///
/// Years without a weather entry or without a summit average are left out of
/// both series.
pub fn wind_correlation(years: &[YearStatistics], weather: &[WeatherSummary]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = years
        .iter()
        .filter_map(|y| {
            let speed = weather
                .iter()
                .find(|w| w.year == y.year)?
                .summit
                .wind_speed_avg?;
            let median = y.times.median;
            (median.is_finite() && speed.is_finite()).then_some((median, speed))
        })
        .collect();

    pearson(&pairs)
}

/// Recomputes the overall headline numbers. `None` for an empty input.
pub fn summarize(years: &[YearStatistics]) -> Option<RaceSummary> {
    let first = years.first()?;
    let last = years.last()?;

    let medians: Vec<f64> = years.iter().map(|y| y.times.median).collect();
    let overall_median = mean(&medians);

    let fastest_by_median = years
        .iter()
        .min_by(|a, b| a.times.median.total_cmp(&b.times.median))?;
    let fastest_by_winner = years
        .iter()
        .min_by(|a, b| a.times.min.total_cmp(&b.times.min))?;

    Some(RaceSummary {
        total_years: years.len(),
        year_range: format!("{}-{}", first.year, last.year),
        overall_median_minutes: overall_median,
        overall_median_formatted: format_minutes(overall_median),
        fastest_year_by_median: fastest_by_median.year,
        fastest_median_time: format_minutes(fastest_by_median.times.median),
        fastest_year_by_winner: fastest_by_winner.year,
        fastest_time: format_minutes(fastest_by_winner.times.min),
        total_finishers: years.iter().map(|y| u64::from(y.count)).sum(),
    })
}

/// Start versus summit average wind, one entry per weather year.
pub fn wind_comparison(weather: &[WeatherSummary]) -> Vec<WindComparison> {
    weather
        .iter()
        .map(|w| {
            let start_avg = w.start.wind_speed_avg;
            let summit_avg = w.summit.wind_speed_avg;
            WindComparison {
                year: w.year,
                start_avg,
                summit_avg,
                summit_delta: start_avg.zip(summit_avg).map(|(s, t)| t - s),
            }
        })
        .collect()
}
