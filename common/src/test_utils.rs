use std::path::PathBuf;

/// Returns the workspace root directory (the parent of this crate).
fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns a fresh, empty directory under `test_output/` for one test.
///
/// Any leftovers from a previous run of the same test are removed first.
pub fn test_output_dir(name: &str) -> PathBuf {
    let dir = workspace_root().join("test_output").join(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("Failed to clear test output directory");
    }
    std::fs::create_dir_all(&dir).expect("Failed to create test output directory");
    dir
}
