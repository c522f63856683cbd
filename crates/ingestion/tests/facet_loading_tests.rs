//! Facet CSV loading against generated tables.

use std::path::Path;

use ingestion::{
    facet_centroid, load_facet_layers, load_matrix, load_opg_series, mask_flat, FacetFiles,
    LoadError,
};
use opg_common::{FacetId, OpgError};
use test_utils::{
    create_elevation_grid, create_facet_blocks, create_lat_mesh, create_lon_mesh,
    create_orientation_grid, facets, temp_test_dir, to_rows, write_matrix_csv, write_opg_csv,
};

const W: usize = 6;
const H: usize = 4;

fn write_layers(dir: &Path, files: &FacetFiles) {
    write_matrix_csv(&dir.join(&files.elevation), &to_rows(&create_elevation_grid(W, H), W)).unwrap();
    write_matrix_csv(
        &dir.join(&files.facets),
        &to_rows(&create_facet_blocks(W, H, 2, facets::WORKSHOP_FACET), W),
    )
    .unwrap();
    write_matrix_csv(&dir.join(&files.latitude), &to_rows(&create_lat_mesh(W, H, 48.0, 47.25), W)).unwrap();
    write_matrix_csv(&dir.join(&files.longitude), &to_rows(&create_lon_mesh(W, H, -123.0, -121.75), W)).unwrap();
    write_matrix_csv(&dir.join(&files.orientation), &to_rows(&create_orientation_grid(W, H), W)).unwrap();
}

#[test]
fn test_load_facet_layers() {
    let dir = temp_test_dir();
    let files = FacetFiles::default();
    write_layers(dir.path(), &files);

    let layers = load_facet_layers(dir.path(), &files).unwrap();
    assert_eq!(layers.elevation.rows(), H);
    assert_eq!(layers.elevation.cols(), W);
    assert_eq!(layers.facets.get(0, 0), Some(&Some(FacetId(facets::WORKSHOP_FACET))));
    assert_eq!(layers.cell_count(FacetId(facets::WORKSHOP_FACET)), 4);
    // Raw codes keep the flat sentinel until masked
    assert!(layers.orientation.iter().any(|c| *c == Some(9)));
    assert!(mask_flat(&layers.orientation).iter().all(|c| *c != Some(9)));
}

#[test]
fn test_centroid_of_generated_facet() {
    let dir = temp_test_dir();
    let files = FacetFiles::default();
    write_layers(dir.path(), &files);
    let layers = load_facet_layers(dir.path(), &files).unwrap();

    // Block (0, 0) covers rows 0..2 and cols 0..2
    let (lon, lat) = facet_centroid(
        &layers.facets,
        &layers.longitude,
        &layers.latitude,
        FacetId(facets::WORKSHOP_FACET),
    )
    .unwrap();
    assert!((lon - (-122.875)).abs() < 1e-9);
    assert!((lat - 47.875).abs() < 1e-9);

    let err = facet_centroid(
        &layers.facets,
        &layers.longitude,
        &layers.latitude,
        FacetId(facets::ABSENT_FACET),
    )
    .unwrap_err();
    assert!(matches!(err, OpgError::FacetNotFound(_)));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = temp_test_dir();
    let err = load_facet_layers(dir.path(), &FacetFiles::default()).unwrap_err();
    assert!(err.is_not_found(), "got {:?}", err);
}

#[test]
fn test_ragged_rows_name_file_and_line() {
    let dir = temp_test_dir();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "1,2,3\n4,5\n").unwrap();

    match load_matrix(&path).unwrap_err() {
        LoadError::Parse { path: p, line, .. } => {
            assert_eq!(p, path);
            assert_eq!(line, Some(2));
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_empty_matrix_is_parse_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "").unwrap();
    assert!(matches!(load_matrix(&path), Err(LoadError::Parse { .. })));
}

#[test]
fn test_layer_shape_mismatch_rejected() {
    let dir = temp_test_dir();
    let files = FacetFiles::default();
    write_layers(dir.path(), &files);
    // Overwrite longitude with a transposed mesh
    write_matrix_csv(&dir.path().join(&files.longitude), &to_rows(&create_lon_mesh(H, W, -123.0, -121.0), H)).unwrap();

    let err = load_facet_layers(dir.path(), &files).unwrap_err();
    assert!(matches!(err, LoadError::Opg(OpgError::ShapeMismatch { .. })));
}

#[test]
fn test_unknown_orientation_codes_pass_through() {
    let dir = temp_test_dir();
    let files = FacetFiles::default();
    write_layers(dir.path(), &files);
    let mut codes = create_orientation_grid(W, H);
    codes[W + 1] = 12.0;
    codes[W + 2] = 0.0;
    write_matrix_csv(&dir.path().join(&files.orientation), &to_rows(&codes, W)).unwrap();

    let layers = load_facet_layers(dir.path(), &files).unwrap();
    assert_eq!(layers.orientation.get(1, 1), Some(&Some(12)));
    assert_eq!(layers.orientation.get(1, 2), Some(&Some(0)));

    let masked = mask_flat(&layers.orientation);
    assert_eq!(masked.get(1, 1), Some(&Some(12)));
    assert_eq!(masked.get(1, 2), Some(&Some(0)));
}

#[test]
fn test_fractional_orientation_code_rejected() {
    let dir = temp_test_dir();
    let files = FacetFiles::default();
    write_layers(dir.path(), &files);
    let mut codes = create_orientation_grid(W, H);
    codes[W + 1] = 2.5;
    write_matrix_csv(&dir.path().join(&files.orientation), &to_rows(&codes, W)).unwrap();

    match load_facet_layers(dir.path(), &files).unwrap_err() {
        LoadError::Parse { line, .. } => assert_eq!(line, Some(2)),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_opg_headers_accept_float_ids() {
    let dir = temp_test_dir();
    let path = dir.path().join("opg.csv");
    std::fs::write(
        &path,
        "date,2131.0,7\n2017-01-01,0.25,\n2017-01-02,nan,1.5\n2017-01-03,NaN,\n",
    )
    .unwrap();

    let series = load_opg_series(&path).unwrap();
    assert_eq!(series.len(), 3);
    assert!(series.contains_facet(FacetId(2131)));
    let column = series.column(FacetId(2131)).unwrap();
    assert_eq!(column[0].1, Some(0.25));
    assert_eq!(column[1].1, None);
    assert_eq!(column[2].1, None);
    assert_eq!(series.get(1, FacetId(7)), Some(1.5));
}

#[test]
fn test_opg_written_by_helper() {
    let dir = temp_test_dir();
    let path = dir.path().join("opg.csv");
    write_opg_csv(
        &path,
        &[facets::WORKSHOP_FACET],
        &[
            ("2017-01-07".to_string(), vec![Some(0.1)]),
            ("2017-01-08".to_string(), vec![None]),
        ],
    )
    .unwrap();
    let series = load_opg_series(&path).unwrap();
    assert_eq!(series.facets(), &[FacetId(facets::WORKSHOP_FACET)]);
    assert_eq!(series.dates().len(), 2);
}

#[test]
fn test_opg_bad_date_is_parse_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("opg.csv");
    std::fs::write(&path, "date,1\n01/07/2017,0.5\n").unwrap();
    match load_opg_series(&path).unwrap_err() {
        LoadError::Parse { line, .. } => assert_eq!(line, Some(2)),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_opg_header_only_is_parse_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("opg.csv");
    std::fs::write(&path, "date,2131\n").unwrap();
    assert!(matches!(load_opg_series(&path), Err(LoadError::Parse { .. })));
}
