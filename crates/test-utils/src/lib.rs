//! Shared test helpers for the facet OPG workspace.
//!
//! - synthetic facet meshes and ERA5-like fields ([`generators`])
//! - CSV writers matching the facet loader's file layouts ([`tables`])
//! - well-known facets, extents and dates ([`fixtures`])
//! - locating optional sample files and scratch directories ([`paths`])
//!
//! ```ignore
//! use test_utils::{require_test_file, fixtures};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;
pub mod tables;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;
pub use tables::*;

/// Resolve a sample file via [`find_test_file`], or print a skip notice and
/// return from the calling test.
///
/// ```ignore
/// #[test]
/// fn test_reads_t700() {
///     let path = require_test_file!("era5_t700.nc");
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: sample '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// `|left - right| <= epsilon`, with both sides widened to f64.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left as f64;
        let right = $right as f64;
        let epsilon = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
