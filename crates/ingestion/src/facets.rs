//! Facet layers and the observed OPG table.
//!
//! The facet stage reads five header-less numeric CSV matrices that share
//! one mesh (elevation, facet id, latitude, longitude, orientation) and a
//! date-indexed OPG table with one column per facet.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use opg_common::time::parse_date;
use opg_common::{DateRange, FacetId, Grid};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LoadError, Result};
use crate::orientation;
use crate::validate;

/// File names of the facet inputs, relative to the facet directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetFiles {
    pub elevation: String,
    pub facets: String,
    pub latitude: String,
    pub longitude: String,
    pub orientation: String,
    pub opg: String,
}

impl Default for FacetFiles {
    fn default() -> Self {
        Self {
            elevation: "elevation.csv".to_string(),
            facets: "facets.csv".to_string(),
            latitude: "lats.csv".to_string(),
            longitude: "lons.csv".to_string(),
            orientation: "orientation.csv".to_string(),
            opg: "opg.csv".to_string(),
        }
    }
}

/// The spatial facet layers on their shared mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetLayers {
    pub elevation: Grid<f64>,
    pub facets: Grid<Option<FacetId>>,
    pub latitude: Grid<f64>,
    pub longitude: Grid<f64>,
    /// Raw codes 1..=9; flat cells are still 9 here.
    pub orientation: Grid<Option<u8>>,
}

impl FacetLayers {
    /// Number of cells belonging to `facet`.
    pub fn cell_count(&self, facet: FacetId) -> usize {
        self.facets.iter().filter(|f| **f == Some(facet)).count()
    }
}

/// Read the five facet layers and check that they share one shape.
pub fn load_facet_layers(dir: &Path, files: &FacetFiles) -> Result<FacetLayers> {
    let elevation = load_matrix(&dir.join(&files.elevation))?;
    let facets = load_matrix(&dir.join(&files.facets))?.map(|v| FacetId::from_f64(*v));
    let latitude = load_matrix(&dir.join(&files.latitude))?;
    let longitude = load_matrix(&dir.join(&files.longitude))?;

    let orientation_path = dir.join(&files.orientation);
    let raw = load_matrix(&orientation_path)?;
    let codes = raw
        .indexed_iter()
        .map(|((row, _), v)| {
            orientation::code_from_f64(*v)
                .map_err(|msg| LoadError::parse(&orientation_path, Some(row as u64 + 1), msg))
        })
        .collect::<Result<Vec<_>>>()?;
    let orientation = Grid::new(raw.rows(), raw.cols(), codes)?;

    let layers = FacetLayers {
        elevation,
        facets,
        latitude,
        longitude,
        orientation,
    };
    validate::facet_layers(&layers)?;

    info!(
        dir = %dir.display(),
        shape = %layers.elevation.shape(),
        "Loaded facet layers"
    );
    Ok(layers)
}

/// Read a header-less numeric CSV matrix.
///
/// Empty cells and `nan` (any case) are NaN. Rows must all have the same
/// number of columns and the file must contain at least one row.
pub fn load_matrix(path: &Path) -> Result<Grid<f64>> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut cols = None;
    let mut rows = 0usize;
    let mut data = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let line = record.position().map(|p| p.line());
        if record.len() == 1 && record.get(0) == Some("") {
            continue;
        }
        let expected = *cols.get_or_insert(record.len());
        if record.len() != expected {
            return Err(LoadError::parse(
                path,
                line,
                format!("expected {} columns, found {}", expected, record.len()),
            ));
        }
        for field in record.iter() {
            let value = parse_cell(field)
                .ok_or_else(|| LoadError::parse(path, line, format!("not a number: '{}'", field)))?;
            data.push(value.unwrap_or(f64::NAN));
        }
        rows += 1;
    }

    let cols = cols.ok_or_else(|| LoadError::parse(path, None, "no rows"))?;
    debug!(path = %path.display(), rows, cols, "Read CSV matrix");
    Ok(Grid::new(rows, cols, data)?)
}

/// Parse a numeric cell: `Some(None)` for missing, `None` for garbage.
fn parse_cell(field: &str) -> Option<Option<f64>> {
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    let value: f64 = field.parse().ok()?;
    Some(if value.is_nan() { None } else { Some(value) })
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    let line = err.position().map(|p| p.line());
    match err.into_kind() {
        csv::ErrorKind::Io(io) => LoadError::io(path, io),
        other => LoadError::parse(path, line, format!("{:?}", other)),
    }
}

/// Observed orographic precipitation gradients, one row per date and one
/// column per facet.
#[derive(Debug, Clone, PartialEq)]
pub struct OpgSeries {
    dates: Vec<NaiveDate>,
    facets: Vec<FacetId>,
    /// Row-major, `dates.len()` rows of `facets.len()` cells.
    values: Vec<Option<f64>>,
    columns: HashMap<FacetId, usize>,
}

impl OpgSeries {
    /// Build a series from rows of values, one per date.
    pub fn new(
        dates: Vec<NaiveDate>,
        facets: Vec<FacetId>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> std::result::Result<Self, String> {
        if rows.len() != dates.len() {
            return Err(format!("{} dates but {} rows", dates.len(), rows.len()));
        }
        let mut columns = HashMap::with_capacity(facets.len());
        for (i, facet) in facets.iter().enumerate() {
            if columns.insert(*facet, i).is_some() {
                return Err(format!("facet {} appears twice", facet));
            }
        }
        let mut values = Vec::with_capacity(dates.len() * facets.len());
        for (row, date) in rows.into_iter().zip(&dates) {
            if row.len() != facets.len() {
                return Err(format!(
                    "{}: {} values for {} facets",
                    date,
                    row.len(),
                    facets.len()
                ));
            }
            values.extend(row);
        }
        Ok(Self {
            dates,
            facets,
            values,
            columns,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn facets(&self) -> &[FacetId] {
        &self.facets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn contains_facet(&self, facet: FacetId) -> bool {
        self.columns.contains_key(&facet)
    }

    /// Value for one facet on one row.
    pub fn get(&self, row: usize, facet: FacetId) -> Option<f64> {
        let col = *self.columns.get(&facet)?;
        self.values.get(row * self.facets.len() + col).copied().flatten()
    }

    /// The full column of one facet, missing cells included.
    pub fn column(&self, facet: FacetId) -> Option<Vec<(NaiveDate, Option<f64>)>> {
        let col = *self.columns.get(&facet)?;
        let width = self.facets.len();
        Some(
            self.dates
                .iter()
                .enumerate()
                .map(|(row, date)| (*date, self.values[row * width + col]))
                .collect(),
        )
    }

    /// First and last date, if any rows exist.
    pub fn date_span(&self) -> Option<DateRange> {
        let start = self.dates.iter().min()?;
        let end = self.dates.iter().max()?;
        Some(DateRange::new(*start, *end))
    }

    /// Rows whose date falls inside `range`.
    pub fn subset(&self, range: &DateRange) -> Self {
        let width = self.facets.len();
        let mut dates = Vec::new();
        let mut values = Vec::new();
        for (row, date) in self.dates.iter().enumerate() {
            if range.contains(*date) {
                dates.push(*date);
                values.extend_from_slice(&self.values[row * width..(row + 1) * width]);
            }
        }
        Self {
            dates,
            facets: self.facets.clone(),
            values,
            columns: self.columns.clone(),
        }
    }
}

/// Read the OPG table.
///
/// The header is a date column name followed by facet ids (`2131` or
/// `2131.0`). Each row is an ISO date followed by values; empty and `nan`
/// cells are missing.
pub fn load_opg_series(path: &Path) -> Result<OpgSeries> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    if headers.len() < 2 {
        return Err(LoadError::parse(
            path,
            Some(1),
            "header needs a date column and at least one facet",
        ));
    }
    let facets = headers
        .iter()
        .skip(1)
        .map(|h| h.parse::<FacetId>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|msg| LoadError::parse(path, Some(1), msg))?;

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let line = record.position().map(|p| p.line());
        if record.len() != headers.len() {
            return Err(LoadError::parse(
                path,
                line,
                format!("expected {} columns, found {}", headers.len(), record.len()),
            ));
        }
        let date_field = record.get(0).unwrap_or_default();
        let date = parse_date(date_field).map_err(|e| LoadError::parse(path, line, e.to_string()))?;

        let row = record
            .iter()
            .skip(1)
            .map(|field| {
                parse_cell(field)
                    .ok_or_else(|| LoadError::parse(path, line, format!("not a number: '{}'", field)))
            })
            .collect::<Result<Vec<_>>>()?;
        dates.push(date);
        rows.push(row);
    }

    if dates.is_empty() {
        return Err(LoadError::parse(path, None, "no rows"));
    }

    let series = OpgSeries::new(dates, facets, rows).map_err(|msg| LoadError::parse(path, Some(1), msg))?;
    info!(
        path = %path.display(),
        dates = series.len(),
        facets = series.facets().len(),
        "Loaded OPG series"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 1, d).unwrap()
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("1.5"), Some(Some(1.5)));
        assert_eq!(parse_cell(""), Some(None));
        assert_eq!(parse_cell("NaN"), Some(None));
        assert_eq!(parse_cell("nan"), Some(None));
        assert_eq!(parse_cell("2.131e3"), Some(Some(2131.0)));
        assert_eq!(parse_cell("abc"), None);
    }

    #[test]
    fn test_series_column_and_get() {
        let series = OpgSeries::new(
            vec![day(1), day(2)],
            vec![FacetId(7), FacetId(2131)],
            vec![vec![Some(1.0), None], vec![Some(2.0), Some(0.3)]],
        )
        .unwrap();
        assert_eq!(series.get(1, FacetId(2131)), Some(0.3));
        assert_eq!(series.get(0, FacetId(2131)), None);
        assert_eq!(
            series.column(FacetId(2131)).unwrap(),
            vec![(day(1), None), (day(2), Some(0.3))]
        );
        assert!(series.column(FacetId(8)).is_none());
    }

    #[test]
    fn test_series_rejects_duplicate_facets() {
        let err = OpgSeries::new(vec![day(1)], vec![FacetId(1), FacetId(1)], vec![vec![None, None]]);
        assert!(err.is_err());
    }

    #[test]
    fn test_series_subset_and_span() {
        let dates: Vec<_> = (1..=31).map(day).collect();
        let rows = dates.iter().map(|_| vec![Some(0.0)]).collect();
        let series = OpgSeries::new(dates, vec![FacetId(2131)], rows).unwrap();
        assert_eq!(series.date_span(), Some(DateRange::new(day(1), day(31))));

        let sub = series.subset(&DateRange::new(day(7), day(12)));
        assert_eq!(sub.len(), 6);
        assert_eq!(sub.dates().first(), Some(&day(7)));
        assert_eq!(sub.get(5, FacetId(2131)), Some(0.0));
    }
}
