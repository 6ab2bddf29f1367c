//! Application configuration from coursenav.toml

use crate::navigation::RoutingMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "coursenav.toml";

/// Main application configuration from coursenav.toml
///
/// Every field has a default, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the course markdown document
    pub course_path: PathBuf,

    /// Directory holding persisted progress (one JSON file per key)
    pub storage_dir: PathBuf,

    /// Storage key for the progress record
    pub progress_key: String,

    /// URL shape produced by the navigation manager
    pub routing_mode: RoutingMode,

    /// Origin prefixed to shareable URLs (e.g. `https://learn.example.com`)
    pub base_url: String,

    /// Heading level of module headings; auto-detected when absent
    pub module_heading_level: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            course_path: PathBuf::from("Course.md"),
            storage_dir: PathBuf::from(".coursenav"),
            progress_key: "course-progress".to_string(),
            routing_mode: RoutingMode::Path,
            base_url: "http://localhost".to_string(),
            module_heading_level: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a coursenav.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the coursenav.toml configuration file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to a coursenav.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the coursenav.toml file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Resolve relative paths against the directory holding the config file
    pub fn resolve_paths(mut self, config_dir: &Path) -> Self {
        if self.course_path.is_relative() {
            self.course_path = config_dir.join(&self.course_path);
        }
        if self.storage_dir.is_relative() {
            self.storage_dir = config_dir.join(&self.storage_dir);
        }
        self
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.progress_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "progress_key must not be empty".to_string(),
            ));
        }
        if let Some(level) = self.module_heading_level {
            // Lessons sit one level below modules, so h6 modules leave no room
            if !(1..=5).contains(&level) {
                return Err(ConfigError::Invalid(format!(
                    "module_heading_level must be between 1 and 5, got {}",
                    level
                )));
            }
        }
        Ok(())
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_roundtrip() {
        // Arrange: Non-default configuration
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        let config = AppConfig {
            course_path: PathBuf::from("content/Course.md"),
            routing_mode: RoutingMode::Query,
            base_url: "https://learn.example.com".to_string(),
            module_heading_level: Some(3),
            ..AppConfig::default()
        };

        // Act: Save and load back
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert: Identical
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "routing_mode = \"query\"\n").unwrap();

        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.routing_mode, RoutingMode::Query);
        assert_eq!(config.course_path, PathBuf::from("Course.md"));
        assert_eq!(config.progress_key, "course-progress");
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_heading_level_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "module_heading_level = 6\n").unwrap();

        let result = AppConfig::load(&path);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_resolve_paths() {
        let config = AppConfig::default().resolve_paths(Path::new("/srv/course"));
        assert_eq!(config.course_path, PathBuf::from("/srv/course/Course.md"));
        assert_eq!(config.storage_dir, PathBuf::from("/srv/course/.coursenav"));
    }
}
