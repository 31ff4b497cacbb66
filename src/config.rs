use crate::core::{LibraryError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "library.json";

/// Library catalog configuration
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// JSON document holding the whole catalog
    pub data_file: PathBuf,

    /// Save pending changes when the shell exits
    pub save_on_exit: bool,
}

impl LibraryConfig {
    /// Create a configuration for the given data file
    pub fn new<P: AsRef<Path>>(data_file: P) -> Self {
        Self {
            data_file: data_file.as_ref().to_path_buf(),
            save_on_exit: true,
        }
    }

    /// Set the data file
    pub fn data_file<P: AsRef<Path>>(mut self, data_file: P) -> Self {
        self.data_file = data_file.as_ref().to_path_buf();
        self
    }

    /// Enable or disable saving on exit
    pub fn save_on_exit(mut self, enabled: bool) -> Self {
        self.save_on_exit = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(LibraryError::Config("data file path cannot be empty".to_string()));
        }

        if self.data_file.is_dir() {
            return Err(LibraryError::Config(format!(
                "data file '{}' is a directory",
                self.data_file.display()
            )));
        }

        Ok(())
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LibraryConfig::default();
        assert_eq!(config.data_file, PathBuf::from("library.json"));
        assert!(config.save_on_exit);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LibraryConfig::default()
            .data_file("/var/lib/catalog/books.json")
            .save_on_exit(false);

        assert_eq!(config.data_file, PathBuf::from("/var/lib/catalog/books.json"));
        assert!(!config.save_on_exit);
    }

    #[test]
    fn test_validate() {
        assert!(LibraryConfig::default().validate().is_ok());
        assert!(LibraryConfig::new("").validate().is_err());

        let temp_dir = TempDir::new().unwrap();
        let err = LibraryConfig::new(temp_dir.path()).validate().unwrap_err();
        assert!(matches!(err, LibraryError::Config(_)));
    }
}
