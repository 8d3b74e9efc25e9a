//! Directional profile of the race course and wind-impact scoring.
//!
//! The profile is a 16-sector histogram of how much of the course is ridden
//! in each compass direction. It is built once per loaded route and then used
//! to score any wind direction as a net tailwind or headwind.

use serde::Serialize;
use tracing::debug;

use crate::geo::{RoutePoint, SECTOR_COUNT, Sector, bearing_degrees, distance_meters, sector_of};

/// Scores above this are a net tailwind.
pub const BENEFICIAL_THRESHOLD: f64 = 0.3;

/// Scores below this are a net headwind.
pub const DETRIMENTAL_THRESHOLD: f64 = -0.3;

/// Distance travelled per compass sector along an ordered route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalProfile {
    pub distance_by_sector: [f64; SECTOR_COUNT],
    pub percentage_by_sector: [f64; SECTOR_COUNT],
    pub total_distance_meters: f64,
    pub primary_sector: Sector,
}

/// Net effect of a wind direction on the whole course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactCategory {
    Beneficial,
    Neutral,
    Detrimental,
}

impl ImpactCategory {
    /// Maps a normalised tailwind score onto a category.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < DETRIMENTAL_THRESHOLD => ImpactCategory::Detrimental,
            s if s > BENEFICIAL_THRESHOLD => ImpactCategory::Beneficial,
            _ => ImpactCategory::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImpactCategory::Beneficial => "beneficial",
            ImpactCategory::Neutral => "neutral",
            ImpactCategory::Detrimental => "detrimental",
        }
    }
}

/// Score and category for one wind direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindImpact {
    pub wind_direction: f64,
    /// Weighted tailwind component in `[-1, 1]`.
    pub score: f64,
    pub category: ImpactCategory,
}

/// One entry of the compass legend: the impact of wind blowing from a sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectorImpact {
    pub sector: Sector,
    pub travel_percentage: f64,
    pub impact: WindImpact,
}

impl DirectionalProfile {
    /// Builds the profile from points in traversal order.
    ///
    /// Returns `None` when fewer than two points are supplied or the route has
    /// no length; callers treat that as "wind analysis disabled". Segments
    /// whose distance or bearing is not finite are skipped.
    pub fn build(points: &[RoutePoint]) -> Option<Self> {
        if points.len() < 2 {
            debug!(points = points.len(), "Route too short for a directional profile");
            return None;
        }

        let mut distance_by_sector = [0.0; SECTOR_COUNT];
        let mut total = 0.0;
        let mut skipped = 0usize;

        for pair in points.windows(2) {
            let distance = distance_meters(&pair[0], &pair[1]);
            let sector = sector_of(bearing_degrees(&pair[0], &pair[1]));

            match sector {
                Some(sector) if distance.is_finite() => {
                    distance_by_sector[sector.index()] += distance;
                    total += distance;
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped, "Skipped route segments with invalid coordinates");
        }

        if total <= 0.0 {
            debug!("Route has zero length, no directional profile");
            return None;
        }

        let mut percentage_by_sector = [0.0; SECTOR_COUNT];
        for (pct, distance) in percentage_by_sector.iter_mut().zip(distance_by_sector) {
            *pct = distance / total * 100.0;
        }

        // strict comparison keeps the lowest index on ties
        let mut primary = 0;
        for (i, pct) in percentage_by_sector.iter().enumerate() {
            if *pct > percentage_by_sector[primary] {
                primary = i;
            }
        }

        Some(DirectionalProfile {
            distance_by_sector,
            percentage_by_sector,
            total_distance_meters: total,
            primary_sector: Sector::from_index(primary),
        })
    }

    pub fn distance(&self, sector: Sector) -> f64 {
        self.distance_by_sector[sector.index()]
    }

    pub fn percentage(&self, sector: Sector) -> f64 {
        self.percentage_by_sector[sector.index()]
    }

    /// Percentage-weighted tailwind component for a wind direction, in `[-1, 1]`.
    ///
    /// A wind direction equal to a sector's travel bearing counts as a pure
    /// headwind for that sector (component -1), the reverse bearing as a
    /// pure tailwind (+1).
    pub fn wind_score(&self, wind_direction: f64) -> f64 {
        let weighted: f64 = Sector::ALL
            .iter()
            .filter(|s| self.percentage(**s) > 0.0)
            .map(|s| {
                let mut diff = (wind_direction - s.nominal_bearing()).abs();
                if diff > 180.0 {
                    diff = 360.0 - diff;
                }
                -diff.to_radians().cos() * self.percentage(*s)
            })
            .sum();

        weighted / 100.0
    }

    /// Scores and classifies one wind direction.
    pub fn classify_wind_impact(&self, wind_direction: f64) -> WindImpact {
        let score = self.wind_score(wind_direction);
        WindImpact {
            wind_direction,
            score,
            category: ImpactCategory::from_score(score),
        }
    }

    /// Classifies wind from each of the 16 sectors, in sector order.
    pub fn wind_legend(&self) -> Vec<SectorImpact> {
        Sector::ALL
            .iter()
            .map(|s| SectorImpact {
                sector: *s,
                travel_percentage: self.percentage(*s),
                impact: self.classify_wind_impact(s.nominal_bearing()),
            })
            .collect()
    }
}
