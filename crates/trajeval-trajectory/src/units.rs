use serde::{Deserialize, Serialize};

/// Unit of a delta, an error value or a statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Dimensionless.
    #[default]
    None,
    /// Millimeters.
    Millimeters,
    /// Centimeters.
    Centimeters,
    /// Meters.
    Meters,
    /// Kilometers.
    Kilometers,
    /// Seconds.
    Seconds,
    /// Degrees.
    Degrees,
    /// Radians.
    Radians,
    /// Pose indices.
    Frames,
    /// Percent, for display.
    Percent,
}

impl Unit {
    /// Short display name, e.g. `"m"` or `"deg"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::None => "unit-less",
            Unit::Millimeters => "mm",
            Unit::Centimeters => "cm",
            Unit::Meters => "m",
            Unit::Kilometers => "km",
            Unit::Seconds => "s",
            Unit::Degrees => "deg",
            Unit::Radians => "rad",
            Unit::Frames => "frames",
            Unit::Percent => "%",
        }
    }

    /// True for length units.
    pub fn is_length(&self) -> bool {
        self.meter_scale_factor().is_some()
    }

    /// True for degrees and radians.
    pub fn is_angle(&self) -> bool {
        matches!(self, Unit::Degrees | Unit::Radians)
    }

    /// Factor converting a value in this unit to meters, for length units.
    pub fn meter_scale_factor(&self) -> Option<f64> {
        match self {
            Unit::Millimeters => Some(1e-3),
            Unit::Centimeters => Some(1e-2),
            Unit::Meters => Some(1.0),
            Unit::Kilometers => Some(1e3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_classes() {
        assert!(Unit::Meters.is_length());
        assert!(Unit::Millimeters.is_length());
        assert!(!Unit::Degrees.is_length());
        assert!(Unit::Radians.is_angle());
        assert!(!Unit::Frames.is_angle());
        assert_eq!(Unit::Kilometers.meter_scale_factor(), Some(1e3));
        assert_eq!(Unit::None.to_string(), "unit-less");
    }
}
