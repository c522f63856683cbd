//! The six ERA5 variables and their fixed unit conversions.

use serde::{Deserialize, Serialize};

/// Unit conversion from source to display units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UnitConversion {
    /// No conversion
    #[default]
    None,
    /// Multiply (e.g. m to mm: x 1000)
    Scale(f64),
    /// Subtract a value (e.g. K to deg C: subtract 273.15)
    Subtract(f64),
    /// Divide by a value (e.g. geopotential to height: divide by 9.81)
    Divide(f64),
}

impl UnitConversion {
    /// Source to display units.
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Scale(factor) => value * factor,
            Self::Subtract(offset) => value - offset,
            Self::Divide(divisor) => value / divisor,
        }
    }

    /// Display to source units.
    pub fn invert(&self, value: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Scale(factor) => value / factor,
            Self::Subtract(offset) => value + offset,
            Self::Divide(divisor) => value * divisor,
        }
    }

    pub fn apply_in_place(&self, values: &mut [f64]) {
        if matches!(self, Self::None) {
            return;
        }
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }
}

/// How sub-daily steps collapse into one daily grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyReduction {
    Sum,
    Mean,
}

/// Standard gravity used to turn geopotential into height.
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Kelvin offset of the Celsius scale.
pub const KELVIN_OFFSET: f64 = 273.15;

/// One of the six reanalysis variables plotted per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtmosVariable {
    Ivt,
    Precipitation,
    Temperature700,
    UWind700,
    VWind700,
    Geopotential500,
}

impl AtmosVariable {
    /// Panel order of the daily figure.
    pub const ALL: [AtmosVariable; 6] = [
        AtmosVariable::Ivt,
        AtmosVariable::Precipitation,
        AtmosVariable::Temperature700,
        AtmosVariable::UWind700,
        AtmosVariable::VWind700,
        AtmosVariable::Geopotential500,
    ];

    /// Short key used in logs and config.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ivt => "ivt",
            Self::Precipitation => "tp",
            Self::Temperature700 => "t700",
            Self::UWind700 => "u700",
            Self::VWind700 => "v700",
            Self::Geopotential500 => "z500",
        }
    }

    /// Key of the variable in YAML config maps (its serde name).
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Ivt => "ivt",
            Self::Precipitation => "precipitation",
            Self::Temperature700 => "temperature700",
            Self::UWind700 => "u_wind700",
            Self::VWind700 => "v_wind700",
            Self::Geopotential500 => "geopotential500",
        }
    }

    /// Panel title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Ivt => "IVT",
            Self::Precipitation => "Precipitation",
            Self::Temperature700 => "700 hPa Temperature",
            Self::UWind700 => "700 hPa U Wind",
            Self::VWind700 => "700 hPa V Wind",
            Self::Geopotential500 => "500 hPa Geopotential Height",
        }
    }

    /// Variable names tried inside the NetCDF file, in order.
    pub fn nc_names(&self) -> &'static [&'static str] {
        match self {
            Self::Ivt => &["ivt", "IVT"],
            Self::Precipitation => &["tp", "precipitation"],
            Self::Temperature700 => &["t", "ta", "temperature"],
            Self::UWind700 => &["u", "ua", "u_component_of_wind"],
            Self::VWind700 => &["v", "va", "v_component_of_wind"],
            Self::Geopotential500 => &["z", "geopotential"],
        }
    }

    /// Nominal pressure level in hPa, for upper-air variables.
    pub fn level_hpa(&self) -> Option<f64> {
        match self {
            Self::Temperature700 | Self::UWind700 | Self::VWind700 => Some(700.0),
            Self::Geopotential500 => Some(500.0),
            Self::Ivt | Self::Precipitation => None,
        }
    }

    pub fn source_units(&self) -> &'static str {
        match self {
            Self::Ivt => "kg m-1 s-1",
            Self::Precipitation => "m",
            Self::Temperature700 => "K",
            Self::UWind700 | Self::VWind700 => "m s-1",
            Self::Geopotential500 => "m2 s-2",
        }
    }

    pub fn display_units(&self) -> &'static str {
        match self {
            Self::Ivt => "kg m-1 s-1",
            Self::Precipitation => "mm",
            Self::Temperature700 => "deg C",
            Self::UWind700 | Self::VWind700 => "m s-1",
            Self::Geopotential500 => "m",
        }
    }

    pub fn conversion(&self) -> UnitConversion {
        match self {
            Self::Precipitation => UnitConversion::Scale(1000.0),
            Self::Temperature700 => UnitConversion::Subtract(KELVIN_OFFSET),
            Self::Geopotential500 => UnitConversion::Divide(STANDARD_GRAVITY),
            Self::Ivt | Self::UWind700 | Self::VWind700 => UnitConversion::None,
        }
    }

    /// Accumulations add up over a day; state variables are averaged.
    pub fn daily_reduction(&self) -> DailyReduction {
        match self {
            Self::Precipitation => DailyReduction::Sum,
            _ => DailyReduction::Mean,
        }
    }
}

impl std::fmt::Display for AtmosVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
