//! Test data generators for synthetic facet and reanalysis grids.
//!
//! Every generator returns row-major `Vec<f64>` data (row 0 first) in the
//! units the raw source files use, so loaders can be tested against known
//! conversions.

/// Latitude mesh, north to south, one value per cell.
pub fn create_lat_mesh(width: usize, height: usize, north: f64, south: f64) -> Vec<f64> {
    let step = if height > 1 {
        (north - south) / (height - 1) as f64
    } else {
        0.0
    };
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let lat = north - row as f64 * step;
        data.extend(std::iter::repeat(lat).take(width));
    }
    data
}

/// Longitude mesh, west to east, one value per cell.
pub fn create_lon_mesh(width: usize, height: usize, west: f64, east: f64) -> Vec<f64> {
    let step = if width > 1 {
        (east - west) / (width - 1) as f64
    } else {
        0.0
    };
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(west + col as f64 * step);
        }
    }
    data
}

/// Evenly spaced 1-D axis from `first` to `last` inclusive.
pub fn create_axis(first: f64, last: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![first; n];
    }
    let step = (last - first) / (n - 1) as f64;
    (0..n).map(|i| first + i as f64 * step).collect()
}

/// Facet ids laid out in square blocks of `block` cells.
///
/// Block (br, bc) gets id `first_id + br * blocks_per_row + bc`.
pub fn create_facet_blocks(width: usize, height: usize, block: usize, first_id: u32) -> Vec<f64> {
    let block = block.max(1);
    let blocks_per_row = (width + block - 1) / block;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let id = first_id as usize + (row / block) * blocks_per_row + col / block;
            data.push(id as f64);
        }
    }
    data
}

/// Orientation codes cycling through 1..=9, so every ninth cell is flat.
pub fn create_orientation_grid(width: usize, height: usize) -> Vec<f64> {
    (0..width * height).map(|i| (i % 9 + 1) as f64).collect()
}

/// Elevation ramp in metres rising towards the east.
pub fn create_elevation_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(50.0 + col as f64 * 25.0 + (row % 3) as f64 * 5.0);
        }
    }
    data
}

/// Temperature-like values in Kelvin, 250 K to 310 K.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f64 / width.max(1) as f64;
            let y_factor = row as f64 / height.max(1) as f64;
            data.push(250.0 + x_factor * 30.0 + y_factor * 30.0);
        }
    }
    data
}

/// U wind component in m/s, varying with row (-20 to +20).
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let lat_factor = (row as f64 / height.max(1) as f64 - 0.5) * 2.0;
        data.extend(std::iter::repeat(lat_factor * 20.0).take(width));
    }
    data
}

/// V wind component in m/s, varying with column (-15 to +15).
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f64 / width.max(1) as f64 - 0.5) * 2.0;
            data.push(lon_factor * 15.0);
        }
    }
    data
}

/// Geopotential in m^2/s^2 around the 500 hPa surface (about 5400-5800 m).
pub fn create_geopotential_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let ridge = ((col as f64 / width.max(1) as f64) * std::f64::consts::PI).sin();
            let height_m = 5400.0 + 300.0 * ridge + row as f64 * 2.0;
            data.push(height_m * 9.81);
        }
    }
    data
}

/// Deterministic precipitation accumulations in metres (mostly dry).
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let precip = if hash % 4 == 0 {
                (hash % 5000) as f64 / 100_000.0 // up to 50 mm
            } else {
                0.0
            };
            data.push(precip);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Split row-major data into rows, the layout CSV writers want.
pub fn to_rows(data: &[f64], width: usize) -> Vec<Vec<f64>> {
    data.chunks(width.max(1)).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meshes_run_north_to_south_and_west_to_east() {
        let lat = create_lat_mesh(3, 4, 48.0, 45.0);
        let lon = create_lon_mesh(3, 4, -124.0, -122.0);
        assert_eq!(lat[0], 48.0);
        assert_eq!(lat[9], 45.0);
        assert_eq!(lon[0], -124.0);
        assert_eq!(lon[2], -122.0);
        assert_eq!(lon[3], -124.0);
    }

    #[test]
    fn test_axis_endpoints() {
        let axis = create_axis(50.0, 40.0, 41);
        assert_eq!(axis.len(), 41);
        assert_eq!(axis[0], 50.0);
        assert!((axis[40] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_facet_blocks() {
        let ids = create_facet_blocks(4, 4, 2, 100);
        assert_eq!(ids[0], 100.0);
        assert_eq!(ids[2], 101.0);
        assert_eq!(ids[8], 102.0);
        assert_eq!(ids[15], 103.0);
    }

    #[test]
    fn test_orientation_contains_flat_sentinel() {
        let codes = create_orientation_grid(3, 3);
        assert_eq!(codes[8], 9.0);
        assert!(codes.iter().all(|c| (1.0..=9.0).contains(c)));
    }

    #[test]
    fn test_temperature_range() {
        let grid = create_temperature_grid(100, 100);
        let min = grid.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = grid.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min >= 250.0);
        assert!(max <= 310.0);
    }

    #[test]
    fn test_precipitation_deterministic() {
        let grid1 = create_precipitation_grid(50, 50, 42);
        let grid2 = create_precipitation_grid(50, 50, 42);
        assert_eq!(grid1, grid2);
        assert!(grid1.iter().all(|&v| (0.0..=0.05).contains(&v)));
    }

    #[test]
    fn test_to_rows() {
        let rows = to_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        assert_eq!(rows, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }
}
