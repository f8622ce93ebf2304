//! Horizontal distance units used for display and file-unit conversion
//!
//! Geometry math always runs in the grid's native coordinate system; units only
//! scale coordinates read from or written to files and label reported values.

use std::fmt;
use std::str::FromStr;

use crate::io::error::{GridError, invalid_parameter};

/// Meters per international foot
const METERS_PER_FOOT: f64 = 0.3048;

/// Horizontal distance unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    /// No unit configured; conversions are identity
    #[default]
    Undefined,
    /// SI meters
    Meters,
    /// International feet
    Feet,
}

impl DistanceUnit {
    /// Short label for display
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Undefined => "",
            Self::Meters => "m",
            Self::Feet => "ft",
        }
    }

    const fn meters_per_unit(self) -> Option<f64> {
        match self {
            Self::Undefined => None,
            Self::Meters => Some(1.0),
            Self::Feet => Some(METERS_PER_FOOT),
        }
    }

    /// Convert a distance from this unit into `target`
    ///
    /// Either side being undefined leaves the value untouched.
    pub fn convert(self, value: f64, target: Self) -> f64 {
        match (self.meters_per_unit(), target.meters_per_unit()) {
            (Some(from), Some(to)) => value * from / to,
            _ => value,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Meters => "meters",
            Self::Feet => "feet",
        };
        f.write_str(name)
    }
}

impl FromStr for DistanceUnit {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "undefined" | "none" => Ok(Self::Undefined),
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Self::Meters),
            "ft" | "foot" | "feet" => Ok(Self::Feet),
            other => Err(invalid_parameter(
                "xy_unit",
                &other,
                &"expected meters, feet or undefined",
            )),
        }
    }
}

/// Unit preferences supplied by the host application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitPreferences {
    /// Active horizontal distance unit
    pub horizontal: DistanceUnit,
}

impl UnitPreferences {
    /// Preferences with the given horizontal unit
    pub const fn new(horizontal: DistanceUnit) -> Self {
        Self { horizontal }
    }

    /// Resolve the unit to use for data stored in `file_unit`
    ///
    /// An undefined application unit adopts the file's unit, so values pass
    /// through unchanged.
    pub const fn resolve(self, file_unit: DistanceUnit) -> DistanceUnit {
        match self.horizontal {
            DistanceUnit::Undefined => file_unit,
            unit => unit,
        }
    }

    /// Format a distance with the preferred unit label
    pub fn format_distance(self, value: f64) -> String {
        match self.horizontal {
            DistanceUnit::Undefined => format!("{value:.3}"),
            unit => format!("{value:.3} {}", unit.symbol()),
        }
    }
}
