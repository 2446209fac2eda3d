//! Test support shared by the sen2neon crates.
//!
//! - [`fixtures`]: request constants, quota rejection messages, image
//!   properties and CSV snippets in the layouts the service and tables use
//! - [`generators`]: wavelength grids, response curves and band cubes
//! - [`paths`]: locating checked-in and optional test data
//!
//! Used as a dev-dependency only:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve an optional test data file or return early from the test.
///
/// Full published SRF tables are not part of the repository; tests that want
/// them run only where [`find_test_file`] can locate the file.
///
/// ```ignore
/// #[test]
/// fn test_full_table() {
///     let path = require_test_file!("srf_s2a.csv");
///     let table = SrfTable::from_path(SensorVariant::Sentinel2A, &path).unwrap();
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: {} not found (set TEST_DATA_DIR to run)", $name);
                return;
            }
        }
    }};
}

/// Assert `|left - right| <= epsilon`, comparing as `f64`.
///
/// Accepts any numeric expressions, so `f32` band values can be checked
/// against `f64` weights directly.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= epsilon,
            "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > `{:?}`",
            left,
            right,
            diff,
            epsilon
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_mixed_precision() {
        assert_approx_eq!(0.1_f32, 0.1_f64, 1e-7);
        assert_approx_eq!(-5.5, -5.500001, 1e-4);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_eq_outside_epsilon() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
