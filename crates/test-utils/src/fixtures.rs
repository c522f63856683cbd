//! Common test fixtures for facet OPG tests.

/// Facet ids used across the suite.
pub mod facets {
    /// The facet the workshop labels on its overview map.
    pub const WORKSHOP_FACET: u32 = 2131;

    /// An id that never appears in generated grids.
    pub const ABSENT_FACET: u32 = 999_999;
}

/// Geographic extents as (min_lon, max_lon, min_lat, max_lat).
pub mod extent {
    /// Olympic and Cascade ranges, Washington State.
    pub const WASHINGTON: (f64, f64, f64, f64) = (-125.0, -116.5, 45.5, 49.0);

    /// ERA5 download box for the daily panels.
    pub const PACIFIC_NORTHWEST: (f64, f64, f64, f64) = (-140.0, -110.0, 35.0, 55.0);

    /// Simple 10x10 degree box around the origin.
    pub const SIMPLE: (f64, f64, f64, f64) = (-5.0, 5.0, -5.0, 5.0);
}

/// Dates used by the subsetting scenarios.
pub mod dates {
    /// First day of the daily ERA5 fixture month.
    pub const MONTH_START: &str = "2017-01-01";

    /// Number of daily records in the fixture month.
    pub const MONTH_DAYS: usize = 31;

    /// The atmospheric river window plotted in the workshop.
    pub const EVENT_START: &str = "2017-01-07";
    pub const EVENT_END: &str = "2017-01-12";

    /// Number of days in the event window.
    pub const EVENT_DAYS: usize = 6;

    /// CF units ERA5 files carry on their time axis.
    pub const ERA5_TIME_UNITS: &str = "hours since 1900-01-01 00:00:00.0";

    /// Hours from 1900-01-01 to 2017-01-01.
    pub const HOURS_TO_2017: f64 = 1_025_616.0;
}

/// Sample ERA5 file names looked up with `require_test_file!`.
pub mod era5 {
    pub const IVT: &str = "era5_ivt.nc";
    pub const PRECIPITATION: &str = "era5_tp.nc";
    pub const TEMPERATURE_700: &str = "era5_t700.nc";
    pub const U_WIND_700: &str = "era5_u700.nc";
    pub const V_WIND_700: &str = "era5_v700.nc";
    pub const GEOPOTENTIAL_500: &str = "era5_z500.nc";
}
