use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Store file name used by [`UnitTestFixture::create_store`].
pub const STORE_FILE: &str = "data.csv";

/// Test fixture providing isolated filesystem environment.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.data_path
    }

    /// Absolute path of `relative_path` inside the fixture; nothing is created.
    #[must_use]
    pub fn path(&self, relative_path: &str) -> PathBuf {
        self.data_path.join(relative_path)
    }

    /// Create a test file with content.
    pub fn create_file(&self, relative_path: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let content = content.as_ref();
        let full_path = self.path(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write a record store.
    pub fn create_store(&self, records: &str) -> PathBuf {
        self.create_file(STORE_FILE, records)
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
