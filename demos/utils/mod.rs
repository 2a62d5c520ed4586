use std::path::PathBuf;

/// Path of the bundled funding sample, relative to the crate root.
pub fn sample_csv_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("startup_sample.csv")
}
