//! The dashboard dataset produced by the ingestion pipeline.
//!
//! Ordering precondition: `statistics.by_year` must be sorted ascending by
//! year. [`crate::stats`] and [`crate::layout`] rely on it and never re-sort;
//! [`Dataset::from_json`] only warns when it is violated.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Finish-time summary for one year, in minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSummary {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub mean: f64,
    pub p75: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Display strings matching [`TimeSummary`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattedTimes {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub p25: Option<String>,
    #[serde(default)]
    pub median: Option<String>,
    #[serde(default)]
    pub mean: Option<String>,
    #[serde(default)]
    pub p75: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

/// Aggregated results of one race year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearStatistics {
    pub year: i32,
    pub count: u32,
    pub times: TimeSummary,
    #[serde(default)]
    pub times_formatted: FormattedTimes,
}

/// Weather averages at one station over the race window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationWeather {
    #[serde(default)]
    pub wind_speed_avg: Option<f64>,
    #[serde(default)]
    pub wind_speed_max: Option<f64>,
    #[serde(default)]
    pub wind_gust_max: Option<f64>,
    #[serde(default)]
    pub temperature_avg: Option<f64>,
    /// Degrees clockwise from north; absent without a sensor reading.
    #[serde(default)]
    pub wind_direction_avg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub year: i32,
    #[serde(default)]
    pub start: LocationWeather,
    #[serde(default)]
    pub summit: LocationWeather,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub year: i32,
    pub time_seconds: f64,
    pub place: u32,
    #[serde(default)]
    pub time_formatted: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl Performance {
    pub fn time_minutes(&self) -> f64 {
        self.time_seconds / 60.0
    }
}

/// One rider's results across years, ordered by year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderRecord {
    pub name: String,
    pub years_participated: u32,
    pub performances: Vec<Performance>,
}

impl RiderRecord {
    pub fn performance_in(&self, year: i32) -> Option<&Performance> {
        self.performances.iter().find(|p| p.year == year)
    }
}

/// Headline numbers across all years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub overall_median_minutes: f64,
    #[serde(default)]
    pub overall_median_formatted: Option<String>,
    #[serde(default)]
    pub wind_correlation: Option<f64>,
    #[serde(default)]
    pub fastest_year_by_median: Option<i32>,
    #[serde(default)]
    pub fastest_median_time: Option<String>,
    #[serde(default)]
    pub fastest_year_by_winner: Option<i32>,
    #[serde(default)]
    pub fastest_time: Option<String>,
    #[serde(default)]
    pub total_years: usize,
    #[serde(default)]
    pub total_finishers: Option<u64>,
    #[serde(default)]
    pub year_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub overall: OverallStatistics,
    pub by_year: Vec<YearStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    #[serde(default)]
    pub by_year: Vec<WeatherSummary>,
}

/// Everything the engine reads. Loaded once per session and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub race_name: Option<String>,
    #[serde(default)]
    pub generated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub years: Vec<i32>,
    pub statistics: Statistics,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub riders: Vec<RiderRecord>,
}

impl Dataset {
    /// Decodes the dashboard JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON for the dataset schema.
    pub fn from_json(text: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(text).context("Invalid dashboard dataset JSON")?;
        dataset.check_ordering();
        debug!(
            years = dataset.statistics.by_year.len(),
            weather_years = dataset.weather.by_year.len(),
            riders = dataset.riders.len(),
            "Dataset decoded"
        );
        Ok(dataset)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).context("Dataset is not valid UTF-8")?;
        Self::from_json(text)
    }

    /// Loads the dataset from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read dataset '{path}'"))?;
        Self::from_json(&content)
    }

    /// Whether `statistics.by_year` is strictly ascending by year.
    pub fn is_sorted_by_year(&self) -> bool {
        self.statistics
            .by_year
            .windows(2)
            .all(|w| w[0].year < w[1].year)
    }

    fn check_ordering(&self) {
        if !self.is_sorted_by_year() {
            warn!("statistics.by_year is not sorted ascending by year; results will be unreliable");
        }
    }

    pub fn year_statistics(&self) -> &[YearStatistics] {
        &self.statistics.by_year
    }

    pub fn weather_for(&self, year: i32) -> Option<&WeatherSummary> {
        self.weather.by_year.iter().find(|w| w.year == year)
    }

    /// Looks up a rider by exact name.
    pub fn rider(&self, name: &str) -> Option<&RiderRecord> {
        self.riders.iter().find(|r| r.name == name)
    }

    /// Riders with results in two or more years, sorted by name.
    pub fn returning_riders(&self) -> Vec<&RiderRecord> {
        let mut riders: Vec<&RiderRecord> = self
            .riders
            .iter()
            .filter(|r| r.performances.len() >= 2)
            .collect();
        riders.sort_by(|a, b| a.name.cmp(&b.name));
        riders
    }

    /// First and last year of the statistics, by position.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let by_year = &self.statistics.by_year;
        Some((by_year.first()?.year, by_year.last()?.year))
    }
}

/// Years inside `[start_year, end_year]`, in input order.
pub fn years_in_range(years: &[YearStatistics], start_year: i32, end_year: i32) -> Vec<&YearStatistics> {
    years
        .iter()
        .filter(|y| y.year >= start_year && y.year <= end_year)
        .collect()
}

/// Formats minutes as `M:SS`, to the nearest whole second.
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() || minutes < 0.0 {
        return "--:--".to_string();
    }
    // 64.1 * 60.0 is 3845.999..., so round rather than floor
    let total_seconds = (minutes * 60.0).round() as u64;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
