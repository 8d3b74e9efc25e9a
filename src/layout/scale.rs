use serde::Serialize;

use crate::config::LayoutConfig;

/// Fastest time shown on the chart. Fixed so years stay comparable.
pub const MIN_TIME_BOUND: f64 = 40.0;

/// Slowest time shown on the chart.
pub const MAX_TIME_BOUND: f64 = 100.0;

/// Maps minutes onto the vertical axis; faster times sit nearer the top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeScale {
    pub top: f64,
    pub plot_height: f64,
}

impl TimeScale {
    /// `top + (m - 40) / (100 - 40) * plot_height`, unclamped.
    pub fn position(&self, minutes: f64) -> f64 {
        self.top + (minutes - MIN_TIME_BOUND) / (MAX_TIME_BOUND - MIN_TIME_BOUND) * self.plot_height
    }

    /// Position clipped to the plot area, and whether clipping happened.
    pub fn clamped(&self, minutes: f64) -> (f64, bool) {
        let y = self.position(minutes);
        let bottom = self.top + self.plot_height;
        if y < self.top {
            (self.top, true)
        } else if y > bottom {
            (bottom, true)
        } else {
            (y, false)
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.plot_height
    }
}

/// Splits the plot width into `count + 1` slots; year `i` sits on slot `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearScale {
    pub left: f64,
    pub plot_width: f64,
    pub count: usize,
}

impl YearScale {
    pub fn slot_width(&self) -> f64 {
        self.plot_width / (self.count + 1) as f64
    }

    /// Horizontal centre of the `index`-th visible year.
    pub fn position(&self, index: usize) -> f64 {
        self.left + (index + 1) as f64 * self.slot_width()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scales {
    pub time: TimeScale,
    pub year: YearScale,
}

/// Resolves both scales for `visible_years` columns. The time bounds never
/// depend on the data.
pub fn resolve_scales(config: &LayoutConfig, visible_years: usize) -> Scales {
    Scales {
        time: TimeScale {
            top: config.margins.top,
            plot_height: config.plot_height(),
        },
        year: YearScale {
            left: config.margins.left,
            plot_width: config.plot_width(),
            count: visible_years,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_scale() -> TimeScale {
        TimeScale {
            top: 10.0,
            plot_height: 600.0,
        }
    }

    #[test]
    fn test_time_scale_endpoints() {
        let scale = time_scale();
        assert_eq!(scale.position(40.0), 10.0);
        assert_eq!(scale.position(100.0), 610.0);
        assert_eq!(scale.position(70.0), 310.0);
    }

    #[test]
    fn test_faster_times_are_higher() {
        let scale = time_scale();
        assert!(scale.position(55.0) < scale.position(65.0));
    }

    #[test]
    fn test_clamped_outside_window() {
        let scale = time_scale();
        assert_eq!(scale.clamped(30.0), (10.0, true));
        assert_eq!(scale.clamped(130.0), (610.0, true));
        assert_eq!(scale.clamped(70.0), (310.0, false));
    }

    #[test]
    fn test_year_slots_leave_half_slot_margins() {
        let scale = YearScale {
            left: 0.0,
            plot_width: 400.0,
            count: 3,
        };
        assert_eq!(scale.slot_width(), 100.0);
        assert_eq!(scale.position(0), 100.0);
        assert_eq!(scale.position(2), 300.0);
    }

    #[test]
    fn test_resolve_scales_ignores_data() {
        let config = LayoutConfig::default();
        let scales = resolve_scales(&config, 4);

        assert_eq!(scales.time.top, config.margins.top);
        assert_eq!(scales.time.plot_height, config.plot_height());
        assert_eq!(scales.year.count, 4);
    }
}
