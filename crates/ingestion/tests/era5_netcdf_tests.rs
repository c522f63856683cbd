//! End-to-end ERA5 loading through real NetCDF files.
//!
//! Each test writes small ERA5-shaped files with the `netcdf` crate: a
//! twice-daily `time` axis in hours since 1900 covering January 2017, a
//! 3x4 grid, and for upper-air variables a `level` axis of 500/700/850 hPa.
//! Precipitation and temperature are stored packed as `short` with
//! `scale_factor`/`add_offset`/`_FillValue`, like CDS downloads.

use std::path::Path;

use chrono::NaiveDate;
use ingestion::units::STANDARD_GRAVITY;
use ingestion::{load_atmosphere, load_field, AtmosFiles, AtmosVariable, LoadError};
use netcdf_parser::{read_variable, NetCdfError, VariableRequest};
use opg_common::DateRange;
use test_utils::{assert_approx_eq, dates, temp_test_dir};

// ============================================================================
// File writers
// ============================================================================

const LATS: [f64; 3] = [49.0, 48.0, 47.0];
const LONS: [f64; 4] = [-124.0, -123.0, -122.0, -121.0];
const PRESSURE: [f64; 3] = [500.0, 700.0, 850.0];
const CELLS: usize = LATS.len() * LONS.len();
/// Cell stored as `_FillValue` in the packed precipitation file.
const FILLED_CELL: usize = 5;
const SHORT_FILL: i16 = -32767;

/// 00 and 12 UTC for every day of January 2017.
fn january_hours() -> Vec<f64> {
    (0..2 * dates::MONTH_DAYS)
        .map(|i| dates::HOURS_TO_2017 + 12.0 * i as f64)
        .collect()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, d).unwrap()
}

/// How a data variable is laid out on disk.
struct Layout<'a> {
    /// Time offsets; empty means all of January.
    hours: &'a [f64],
    levels: Option<&'a [f64]>,
}

impl Layout<'static> {
    fn surface() -> Layout<'static> {
        Layout { hours: &[], levels: None }
    }
}

fn put_coordinate(file: &mut netcdf::FileMut, name: &str, values: &[f64], units: &str) {
    let mut var = file.add_variable::<f64>(name, &[name]).unwrap();
    var.put_attribute("units", units).unwrap();
    var.put_values(values, ..).unwrap();
}

/// Create a file holding the dimensions and coordinate variables.
fn create_with_axes(path: &Path, hours: &[f64], levels: Option<&[f64]>) -> netcdf::FileMut {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", hours.len()).unwrap();
    if let Some(levels) = levels {
        file.add_dimension("level", levels.len()).unwrap();
    }
    file.add_dimension("latitude", LATS.len()).unwrap();
    file.add_dimension("longitude", LONS.len()).unwrap();

    put_coordinate(&mut file, "time", hours, dates::ERA5_TIME_UNITS);
    if let Some(levels) = levels {
        put_coordinate(&mut file, "level", levels, "millibars");
    }
    put_coordinate(&mut file, "latitude", &LATS, "degrees_north");
    put_coordinate(&mut file, "longitude", &LONS, "degrees_east");
    file
}

fn data_dims(levels: Option<&[f64]>) -> Vec<&'static str> {
    match levels {
        Some(_) => vec!["time", "level", "latitude", "longitude"],
        None => vec!["time", "latitude", "longitude"],
    }
}

/// Physical values in `[time, level, cell]` order.
fn physical(hours: &[f64], levels: Option<&[f64]>, value: impl Fn(usize, usize, usize) -> f64) -> Vec<f64> {
    let nlev = levels.map_or(1, |l| l.len());
    let mut out = Vec::with_capacity(hours.len() * nlev * CELLS);
    for t in 0..hours.len() {
        for l in 0..nlev {
            for c in 0..CELLS {
                out.push(value(t, l, c));
            }
        }
    }
    out
}

/// Write a `double` variable without packing.
fn write_plain(
    path: &Path,
    name: &str,
    units: &str,
    layout: &Layout,
    value: impl Fn(usize, usize, usize) -> f64,
) {
    let hours = if layout.hours.is_empty() { january_hours() } else { layout.hours.to_vec() };
    let mut file = create_with_axes(path, &hours, layout.levels);
    let values = physical(&hours, layout.levels, value);
    let mut var = file.add_variable::<f64>(name, &data_dims(layout.levels)).unwrap();
    var.put_attribute("units", units).unwrap();
    var.put_values(&values, ..).unwrap();
}

/// Write a packed `short` variable; NaN cells are stored as the fill value.
fn write_packed(
    path: &Path,
    name: &str,
    units: &str,
    layout: &Layout,
    (scale, offset): (f64, f64),
    value: impl Fn(usize, usize, usize) -> f64,
) {
    let hours = if layout.hours.is_empty() { january_hours() } else { layout.hours.to_vec() };
    let mut file = create_with_axes(path, &hours, layout.levels);
    let packed: Vec<i16> = physical(&hours, layout.levels, value)
        .into_iter()
        .map(|v| if v.is_nan() { SHORT_FILL } else { ((v - offset) / scale).round() as i16 })
        .collect();
    let mut var = file.add_variable::<i16>(name, &data_dims(layout.levels)).unwrap();
    var.set_fill_value(SHORT_FILL).unwrap();
    var.put_attribute("scale_factor", scale).unwrap();
    var.put_attribute("add_offset", offset).unwrap();
    var.put_attribute("units", units).unwrap();
    var.put_values(&packed, ..).unwrap();
}

const TEMPERATURE_PACKING: (f64, f64) = (0.01, 273.15);

/// Temperature in K per level index: 253.15, 268.15, 283.15.
fn temperature_k(level: usize) -> f64 {
    253.15 + 15.0 * level as f64
}

/// The six files of a complete ERA5 directory.
fn write_era5_dir(dir: &Path) {
    let files = AtmosFiles::default();
    let upper = Layout {
        hours: &[],
        levels: Some(&PRESSURE),
    };

    // Stored under the upper-case alias
    write_plain(&dir.join(&files.ivt), "IVT", "kg m**-1 s**-1", &Layout::surface(), |t, _, c| {
        300.0 + t as f64 + c as f64
    });
    write_packed(
        &dir.join(&files.precipitation),
        "tp",
        "m",
        &Layout::surface(),
        (1.0e-5, 0.0),
        |_, _, c| if c == FILLED_CELL { f64::NAN } else { 0.001 },
    );
    write_packed(
        &dir.join(&files.temperature_700),
        "t",
        "K",
        &upper,
        TEMPERATURE_PACKING,
        |_, l, _| temperature_k(l),
    );
    write_plain(&dir.join(&files.u_wind_700), "u", "m s**-1", &upper, |_, l, _| 5.0 * (l + 1) as f64);
    write_plain(&dir.join(&files.v_wind_700), "v", "m s**-1", &upper, |_, l, _| -2.0 * (l + 1) as f64);
    write_plain(&dir.join(&files.geopotential_500), "z", "m**2 s**-2", &upper, |_, l, _| {
        (5000.0 + 1000.0 * l as f64) * STANDARD_GRAVITY
    });
}

fn event() -> DateRange {
    DateRange::parse(dates::EVENT_START, dates::EVENT_END).unwrap()
}

// ============================================================================
// load_atmosphere
// ============================================================================

#[test]
fn test_load_atmosphere_event_in_display_units() {
    let dir = temp_test_dir();
    write_era5_dir(dir.path());

    let atmosphere = load_atmosphere(dir.path(), &AtmosFiles::default(), &event()).unwrap();

    assert_eq!(atmosphere.days(), (7..=12).map(day).collect::<Vec<_>>());
    for field in atmosphere.fields() {
        assert_eq!(field.len(), 2 * dates::EVENT_DAYS, "{}", field.variable());
        assert_eq!(field.latitudes(), &LATS);
        assert_eq!(field.longitudes(), &LONS);
        assert!(field.times().iter().all(|t| event().contains(t.date())));
    }

    // 700 hPa slice, K to deg C
    for v in atmosphere.temperature_700.values() {
        assert_approx_eq!(*v, -5.0, 1e-6);
    }
    assert!(atmosphere.u_wind_700.values().iter().all(|v| *v == 10.0));
    assert!(atmosphere.v_wind_700.values().iter().all(|v| *v == -4.0));

    // 500 hPa slice, m2 s-2 to m
    for v in atmosphere.geopotential_500.values() {
        assert_approx_eq!(*v, 5000.0, 1e-6);
    }

    // m to mm, fill cells decoded as NaN
    for (i, v) in atmosphere.precipitation.values().iter().enumerate() {
        if i % CELLS == FILLED_CELL {
            assert!(v.is_nan(), "cell {} should be missing", i);
        } else {
            assert_approx_eq!(*v, 1.0, 1e-6);
        }
    }
    let daily_tp = atmosphere.precipitation.daily(day(7)).unwrap();
    assert_approx_eq!(daily_tp.as_slice()[0], 2.0, 1e-6);
    assert!(daily_tp.as_slice()[FILLED_CELL].is_nan());

    // IVT is unconverted; first event step is index 12 of the month
    assert_approx_eq!(atmosphere.ivt.values()[0], 312.0, 1e-9);
}

#[test]
fn test_load_atmosphere_outside_record_is_empty() {
    let dir = temp_test_dir();
    write_era5_dir(dir.path());

    let range = DateRange::parse("2017-03-01", "2017-03-05").unwrap();
    let atmosphere = load_atmosphere(dir.path(), &AtmosFiles::default(), &range).unwrap();
    assert!(atmosphere.days().is_empty());
    assert!(atmosphere.fields().all(|f| f.is_empty()));
}

#[test]
fn test_load_atmosphere_missing_file_is_not_found() {
    let dir = temp_test_dir();
    write_era5_dir(dir.path());
    std::fs::remove_file(dir.path().join(AtmosFiles::default().geopotential_500)).unwrap();

    let err = load_atmosphere(dir.path(), &AtmosFiles::default(), &event()).unwrap_err();
    assert!(err.is_not_found(), "{}", err);
}

// ============================================================================
// Level selection
// ============================================================================

#[test]
fn test_read_variable_selects_requested_level() {
    let dir = temp_test_dir();
    write_era5_dir(dir.path());
    let path = dir.path().join(AtmosFiles::default().temperature_700);

    let t850 = read_variable(&path, &VariableRequest::new("t").at_level(850.0)).unwrap();
    assert_eq!(t850.level, Some(850.0));
    assert_eq!(t850.times.len(), 2 * dates::MONTH_DAYS);
    assert_approx_eq!(t850.values[0], temperature_k(2), 1e-6);

    let err = read_variable(&path, &VariableRequest::new("t").at_level(925.0)).unwrap_err();
    assert!(matches!(err, NetCdfError::MissingData(_)));
}

#[test]
fn test_single_level_file_must_hold_nominal_level() {
    let dir = temp_test_dir();
    let path = dir.path().join("era5_t850.nc");
    let only_850 = Layout {
        hours: &[],
        levels: Some(&[850.0]),
    };
    write_packed(&path, "t", "K", &only_850, TEMPERATURE_PACKING, |_, _, _| temperature_k(2));

    let err = load_field(&path, AtmosVariable::Temperature700).unwrap_err();
    assert!(
        matches!(err, LoadError::NetCdf { source: NetCdfError::MissingData(_), .. }),
        "{}",
        err
    );

    // The same single level is fine when it is the one asked for
    let t850 = read_variable(&path, &VariableRequest::new("t").at_level(850.0)).unwrap();
    assert_eq!(t850.level, Some(850.0));
}

/// Surface-shaped file whose level lives in a scalar `level` variable.
fn write_scalar_level(path: &Path, hpa: f64) {
    let hours = january_hours();
    let mut file = create_with_axes(path, &hours, None);
    {
        let mut level = file.add_variable::<f64>("level", &[]).unwrap();
        level.put_attribute("units", "millibars").unwrap();
        level.put_values(&[hpa], ..).unwrap();
    }
    let values = physical(&hours, None, |_, _, _| 5500.0 * STANDARD_GRAVITY);
    let mut var = file.add_variable::<f64>("z", &data_dims(None)).unwrap();
    var.put_attribute("units", "m**2 s**-2").unwrap();
    var.put_values(&values, ..).unwrap();
}

#[test]
fn test_scalar_level_coordinate_is_checked() {
    let dir = temp_test_dir();

    let z700 = dir.path().join("era5_z700.nc");
    write_scalar_level(&z700, 700.0);
    let err = load_field(&z700, AtmosVariable::Geopotential500).unwrap_err();
    assert!(matches!(err, LoadError::NetCdf { source: NetCdfError::MissingData(_), .. }));

    let z500 = dir.path().join("era5_z500.nc");
    write_scalar_level(&z500, 500.0);
    let field = load_field(&z500, AtmosVariable::Geopotential500).unwrap();
    assert_approx_eq!(field.values()[0], 5500.0, 1e-6);
}

// ============================================================================
// Malformed files
// ============================================================================

#[test]
fn test_fill_value_on_time_axis_is_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join("era5_ivt.nc");
    let mut hours = january_hours();
    // Unmasked NetCDF default fill for doubles
    hours[3] = 9.969_209_968_386_869e36;
    let layout = Layout {
        hours: &hours,
        levels: None,
    };
    write_plain(&path, "ivt", "kg m**-1 s**-1", &layout, |_, _, _| 250.0);

    let err = load_field(&path, AtmosVariable::Ivt).unwrap_err();
    assert!(
        matches!(err, LoadError::NetCdf { source: NetCdfError::InvalidFormat(_), .. }),
        "{}",
        err
    );
}

#[test]
fn test_unknown_variable_names_are_listed() {
    let dir = temp_test_dir();
    let path = dir.path().join("era5_ivt.nc");
    write_plain(&path, "q", "kg kg**-1", &Layout::surface(), |_, _, _| 0.004);

    match load_field(&path, AtmosVariable::Ivt).unwrap_err() {
        LoadError::NetCdf {
            source: NetCdfError::MissingData(message),
            ..
        } => {
            assert!(message.contains("ivt, IVT"), "{}", message);
            assert!(message.contains('q'), "{}", message);
        }
        other => panic!("expected missing variable, got {}", other),
    }
}
