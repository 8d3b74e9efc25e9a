//! Route polyline decoding.
//!
//! Accepts a JSON array of points, a JSON object with a `points` array, or a
//! CSV file with `latitude,longitude` headers (`lat`/`lon` also accepted).

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::geo::RoutePoint;

#[derive(Deserialize)]
#[serde(untagged)]
enum RouteJson {
    Points(Vec<RoutePoint>),
    Wrapped { points: Vec<RoutePoint> },
}

/// Decodes route points from raw bytes, in traversal order.
///
/// # Errors
///
/// Returns an error if the bytes are neither valid route JSON nor CSV with
/// latitude/longitude columns.
pub fn parse_route(bytes: &[u8]) -> Result<Vec<RoutePoint>> {
    let text = std::str::from_utf8(bytes).context("Route is not valid UTF-8")?;
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let route: RouteJson = serde_json::from_str(trimmed).context("Invalid route JSON")?;
        return Ok(match route {
            RouteJson::Points(points) | RouteJson::Wrapped { points } => points,
        });
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(trimmed.as_bytes());
    let mut points = Vec::new();

    for result in rdr.deserialize() {
        let point: RoutePoint = result.context("Invalid route CSV row")?;
        points.push(point);
    }

    Ok(points)
}
