pub mod test_utils {
    use std::path::PathBuf;

    pub fn get_test_data_path() -> PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("src")
            .join("event_log")
            .join("tests")
            .join("test_data")
    }
}
