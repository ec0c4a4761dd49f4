use crate::storage::validate_key;
use crate::store::DEFAULT_KEY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Where records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Storage section
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Option<StorageBackend>,
    /// Directory for file storage; defaults to the platform data dir
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub key: Option<String>,
}

impl StorageConfig {
    pub fn backend(&self) -> StorageBackend {
        self.backend.unwrap_or_default()
    }

    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(DEFAULT_KEY)
    }

    /// Resolve the data directory: configured path, else `<data dir>/roster`,
    /// else `.roster/data` under the working directory
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("roster"))
            .unwrap_or_else(|| Path::new(".roster").join("data"))
    }
}

/// Logging section
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LogConfig {
    /// `EnvFilter` directive; defaults to "warn"
    #[serde(default)]
    pub level: Option<String>,
}

impl LogConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("warn")
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Ask before deleting a record (default true)
    #[serde(default)]
    pub confirm_delete: Option<bool>,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.roster/config.local.toml) > project (.roster/config.toml) > user (~/.roster/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".roster").join("config.toml");
            if user_config.exists() {
                let user = Self::load_from(&user_config)?;
                config.merge(user);
            }
        }

        let project_config = Path::new(".roster").join("config.toml");
        if project_config.exists() {
            let project = Self::load_from(&project_config)?;
            config.merge(project);
        }

        // Should be gitignored
        let local_config = Path::new(".roster").join("config.local.toml");
        if local_config.exists() {
            let local = Self::load_from(&local_config)?;
            config.merge(local);
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority where it sets a value)
    pub fn merge(&mut self, other: Config) {
        if other.storage.backend.is_some() {
            self.storage.backend = other.storage.backend;
        }
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if other.storage.key.is_some() {
            self.storage.key = other.storage.key;
        }

        if other.log.level.is_some() {
            self.log.level = other.log.level;
        }

        if other.confirm_delete.is_some() {
            self.confirm_delete = other.confirm_delete;
        }
    }

    pub fn confirm_delete(&self) -> bool {
        self.confirm_delete.unwrap_or(true)
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = validate_key(self.storage.key()) {
            errors.push(ValidationError {
                field: "storage.key".to_string(),
                message: e.to_string(),
            });
        }

        if let Some(dir) = &self.storage.data_dir {
            if dir.as_os_str().is_empty() {
                errors.push(ValidationError {
                    field: "storage.data_dir".to_string(),
                    message: "Must not be empty".to_string(),
                });
            } else if dir.is_file() {
                errors.push(ValidationError {
                    field: "storage.data_dir".to_string(),
                    message: format!("'{}' is a file, expected a directory", dir.display()),
                });
            }
        }

        if EnvFilter::try_new(self.log.level()).is_err() {
            errors.push(ValidationError {
                field: "log.level".to_string(),
                message: format!("Invalid log filter '{}'", self.log.level()),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend(), StorageBackend::File);
        assert_eq!(config.storage.key(), "employeeData");
        assert_eq!(config.log.level(), "warn");
        assert!(config.confirm_delete());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
confirm_delete = false

[storage]
backend = "memory"
key = "staff"

[log]
level = "debug"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage.backend(), StorageBackend::Memory);
        assert_eq!(config.storage.key(), "staff");
        assert_eq!(config.log.level(), "debug");
        assert!(!config.confirm_delete());
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage\nkey = 1").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn test_merge_prefers_set_values() {
        let mut base = Config::default();
        base.storage.key = Some("base".to_string());
        base.storage.data_dir = Some(PathBuf::from("/tmp/base"));

        let mut other = Config::default();
        other.storage.key = Some("override".to_string());
        other.log.level = Some("info".to_string());

        base.merge(other);
        assert_eq!(base.storage.key(), "override");
        assert_eq!(base.storage.data_dir, Some(PathBuf::from("/tmp/base")));
        assert_eq!(base.log.level(), "info");
        assert!(base.confirm_delete.is_none());
    }

    #[test]
    fn test_merge_can_restore_defaults() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.toml");
        let project = dir.path().join("project.toml");
        std::fs::write(&user, "[storage]\nbackend = \"memory\"\n\n[log]\nlevel = \"debug\"\n").unwrap();
        std::fs::write(&project, "[storage]\nbackend = \"file\"\n\n[log]\nlevel = \"warn\"\n").unwrap();

        let mut config = Config::default();
        config.merge(Config::load_from(&user).unwrap());
        assert_eq!(config.storage.backend(), StorageBackend::Memory);
        assert_eq!(config.log.level(), "debug");

        config.merge(Config::load_from(&project).unwrap());
        assert_eq!(config.storage.backend(), StorageBackend::File);
        assert_eq!(config.log.level(), "warn");

        // A layer that says nothing keeps what came before
        config.merge(Config::default());
        assert_eq!(config.storage.backend(), StorageBackend::File);
    }

    #[test]
    fn test_validate_bad_key() {
        let mut config = Config::default();
        config.storage.key = Some("../escape".to_string());
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field.contains("storage.key"));
    }

    #[test]
    fn test_validate_data_dir_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();

        let mut config = Config::default();
        config.storage.data_dir = Some(file);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("expected a directory"));
    }

    #[test]
    fn test_validate_bad_log_level() {
        let mut config = Config::default();
        config.log.level = Some("roster=loud".to_string());
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field.contains("log.level"));
    }
}
