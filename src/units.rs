//! Distance formatting in metric or imperial units.

use serde::{Deserialize, Serialize};

const METRES_PER_MILE: f64 = 1609.34;

/// Which units distances are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasurementSystem {
    #[default]
    Metric,
    Imperial,
}

impl MeasurementSystem {
    /// Format a distance in km or miles. `round` drops the decimal place for
    /// compact list displays.
    pub fn format_distance(&self, metres: f64, show_unit: bool, round: bool) -> String {
        let (value, unit) = match self {
            MeasurementSystem::Metric => (metres / 1000.0, "km"),
            MeasurementSystem::Imperial => (metres / METRES_PER_MILE, "miles"),
        };
        let number = if round {
            format!("{value:.0}")
        } else {
            format!("{value:.1}")
        };
        if show_unit {
            format!("{number} {unit}")
        } else {
            number
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_formatting() {
        let m = MeasurementSystem::Metric;
        assert_eq!(m.format_distance(12_345.0, true, false), "12.3 km");
        assert_eq!(m.format_distance(12_345.0, true, true), "12 km");
        assert_eq!(m.format_distance(12_345.0, false, true), "12");
    }

    #[test]
    fn test_imperial_formatting() {
        let m = MeasurementSystem::Imperial;
        assert_eq!(m.format_distance(1609.34, true, false), "1.0 miles");
        assert_eq!(m.format_distance(8046.7, true, true), "5 miles");
    }
}
