//! Session state shared by every render: the loaded dataset, the route's
//! directional profile and the highlighted rider.
//!
//! The dataset is fixed at construction and the profile can be set once, so
//! neither needs locking. The highlighted rider is written by interactive
//! input while renders read it, and sits behind a single `RwLock`.

use std::sync::OnceLock;

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::dataset::{Dataset, RiderRecord, years_in_range};
use crate::geo::RoutePoint;
use crate::layout::{self, ChartGeometry, LayoutInput, RenderOptions};
use crate::route::{DirectionalProfile, SectorImpact, WindImpact};
use crate::stats::{self, Outlier, RaceSummary, YearOverYear};

pub struct DashboardState {
    dataset: Dataset,
    config: LayoutConfig,
    profile: OnceLock<DirectionalProfile>,
    highlighted: RwLock<Option<String>>,
}

impl DashboardState {
    /// # Errors
    ///
    /// Returns an error if `config` fails [`LayoutConfig::validate`].
    pub fn new(dataset: Dataset, config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dataset,
            config,
            profile: OnceLock::new(),
            highlighted: RwLock::new(None),
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Builds and stores the directional profile from a loaded route.
    ///
    /// Returns `false` when the route is too short to profile or a profile is
    /// already set; wind classification then stays disabled or unchanged.
    pub fn load_route(&self, points: &[RoutePoint]) -> bool {
        let Some(profile) = DirectionalProfile::build(points) else {
            warn!(points = points.len(), "Route unavailable, wind classification disabled");
            return false;
        };
        info!(
            total_distance_m = profile.total_distance_meters,
            primary_sector = %profile.primary_sector,
            "Directional profile built"
        );
        self.profile.set(profile).is_ok()
    }

    pub fn directional_profile(&self) -> Option<&DirectionalProfile> {
        self.profile.get()
    }

    /// `None` while no route has been profiled.
    pub fn classify_wind_impact(&self, wind_direction: f64) -> Option<WindImpact> {
        self.directional_profile()
            .map(|p| p.classify_wind_impact(wind_direction))
    }

    pub fn wind_legend(&self) -> Vec<SectorImpact> {
        self.directional_profile()
            .map(DirectionalProfile::wind_legend)
            .unwrap_or_default()
    }

    /// Year-over-year metrics over the years in `[start_year, end_year]`.
    pub fn year_over_year(&self, start_year: i32, end_year: i32) -> Option<YearOverYear> {
        let visible: Vec<_> = years_in_range(self.dataset.year_statistics(), start_year, end_year)
            .into_iter()
            .cloned()
            .collect();
        stats::year_over_year(&visible)
    }

    /// Outliers against the dataset's overall median.
    pub fn outliers(&self, start_year: i32, end_year: i32, top_n: usize) -> Vec<Outlier> {
        stats::rank_outliers(
            self.dataset.year_statistics(),
            &self.dataset.weather.by_year,
            self.dataset.statistics.overall.overall_median_minutes,
            start_year,
            end_year,
            top_n,
        )
    }

    /// The dataset's precomputed correlation, recomputed when it is absent.
    pub fn wind_correlation(&self) -> Option<f64> {
        self.dataset.statistics.overall.wind_correlation.or_else(|| {
            stats::wind_correlation(self.dataset.year_statistics(), &self.dataset.weather.by_year)
        })
    }

    pub fn summary(&self) -> Option<RaceSummary> {
        stats::summarize(self.dataset.year_statistics())
    }

    /// Highlights a rider by name. Unknown names leave the selection cleared.
    pub fn select_rider(&self, name: &str) -> bool {
        let found = self.dataset.rider(name).is_some();
        let mut slot = self.highlighted.write();
        if found {
            *slot = Some(name.to_string());
            debug!(rider = name, "Rider selected");
        } else {
            *slot = None;
            warn!(rider = name, "Unknown rider, selection cleared");
        }
        found
    }

    pub fn clear_selection(&self) {
        *self.highlighted.write() = None;
    }

    pub fn selected_rider(&self) -> Option<&RiderRecord> {
        let name = self.highlighted.read().clone()?;
        self.dataset.rider(&name)
    }

    /// Lays out the chart for `[start_year, end_year]` with the current
    /// selection.
    pub fn render(&self, start_year: i32, end_year: i32, options: RenderOptions) -> ChartGeometry {
        let input = LayoutInput {
            years: self.dataset.year_statistics(),
            weather: &self.dataset.weather.by_year,
            profile: self.directional_profile(),
            rider: self.selected_rider(),
        };
        layout::render(&self.config, input, start_year, end_year, options)
    }
}
