use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Smallest accepted gridline spacing, in minutes.
pub const MIN_TICK_STEP_MINUTES: f64 = 0.5;

/// Padding between the chart edge and the plot area, in chart units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 30.0,
            bottom: 50.0,
            left: 60.0,
        }
    }
}

/// Chart dimensions and presentation knobs for [`crate::layout`].
///
/// Stored as a JSON object on disk; omitted keys keep their defaults:
/// ```json
/// { "width": 1200, "height": 600, "margins": { "top": 20, "right": 20, "bottom": 40, "left": 50 } }
/// ```
///
/// The 40–100 minute time window is not part of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    /// Box width as a fraction of one year slot.
    pub box_width_ratio: f64,
    /// Spacing of the horizontal time gridlines, in minutes.
    pub tick_step_minutes: f64,
    /// Default number of outliers reported by the summary.
    pub outlier_count: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
            margins: Margins::default(),
            box_width_ratio: 0.5,
            tick_step_minutes: 10.0,
            outlier_count: 5,
        }
    }
}

impl LayoutConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout config '{path}'"))?;
        Self::from_json(&content)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: LayoutConfig =
            serde_json::from_str(text).context("Invalid layout config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configs that would leave no plot area.
    pub fn validate(&self) -> Result<()> {
        if self.plot_width() <= 0.0 || self.plot_height() <= 0.0 {
            anyhow::bail!(
                "Layout config leaves no plot area ({}x{} with margins {:?})",
                self.width,
                self.height,
                self.margins
            );
        }
        if !(self.box_width_ratio > 0.0 && self.box_width_ratio <= 1.0) {
            anyhow::bail!("box_width_ratio must be in (0, 1], got {}", self.box_width_ratio);
        }
        if !(self.tick_step_minutes >= MIN_TICK_STEP_MINUTES) {
            anyhow::bail!(
                "tick_step_minutes must be at least {MIN_TICK_STEP_MINUTES}, got {}",
                self.tick_step_minutes
            );
        }
        Ok(())
    }

    pub fn plot_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }
}
