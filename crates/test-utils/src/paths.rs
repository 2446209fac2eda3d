//! Locating test data.
//!
//! Small fixtures are checked in under `crates/<name>/testdata/`. Full
//! published SRF tables are optional and found through [`find_test_file`].

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(|p| p.to_path_buf())
        .unwrap_or(manifest_dir)
}

/// `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root().join("crates").join(crate_name).join("testdata")
}

/// Checked-in SRF table in the published column layout (`SR_WL`,
/// `S2A_SR_AV_B1` .. `S2A_SR_AV_B12`), sampled every 5 nm.
pub fn srf_s2a_sample_path() -> PathBuf {
    crate_testdata_dir("spectral").join("srf_s2a_sample.csv")
}

/// First existing location of `name`, searching
/// `$TEST_DATA_DIR`, `tables/` and `testdata/` at the workspace root.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    std::env::var_os("TEST_DATA_DIR")
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain([root.join("tables").join(name), root.join("testdata").join(name)])
        .find(|path| path.exists())
}
