//! Writers for the CSV layouts the facet loader reads.

use std::path::Path;

/// Format a cell the way numpy's `savetxt` would leave it readable.
fn format_cell(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", value)
    }
}

/// Write a header-less numeric matrix.
pub fn write_matrix_csv(path: &Path, rows: &[Vec<f64>]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| format_cell(*v)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write an OPG table: a `date` column followed by one column per facet.
///
/// `None` cells are written empty.
pub fn write_opg_csv(
    path: &Path,
    facets: &[u32],
    rows: &[(String, Vec<Option<f64>>)],
) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["date".to_string()];
    header.extend(facets.iter().map(|f| f.to_string()));
    writer.write_record(&header)?;

    for (date, values) in rows {
        let mut record = vec![date.clone()];
        record.extend(values.iter().map(|v| match v {
            Some(value) => format_cell(*value),
            None => String::new(),
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
