//! Application paths and the suggestion lists read from `data/data.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use serde::Deserialize;
use thiserror::Error;

/// Folder name used beneath the user's home directory when no base directory
/// is given explicitly.
const DATA_DIR_NAME: &str = ".labparts";

/// Every file the application touches, resolved against one base directory.
/// Datasheet links are stored relative to `base_dir`.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_dir: PathBuf,
    pub database: PathBuf,
    pub backup: PathBuf,
    pub data_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    /// Lay out the fixed file locations beneath `base_dir`.
    pub fn from_base(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            database: base_dir.join("db").join("components.db"),
            backup: base_dir.join("db").join("backup.db"),
            data_file: base_dir.join("data").join("data.json"),
            log_file: base_dir.join("labparts.log"),
            base_dir,
        }
    }

    /// Use the explicit base directory when one was given, otherwise fall back
    /// to `~/.labparts`.
    pub fn resolve(base_dir: Option<PathBuf>) -> Result<Self> {
        let base_dir = match base_dir {
            Some(dir) => dir,
            None => {
                let base_dirs =
                    BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
                base_dirs.home_dir().join(DATA_DIR_NAME)
            }
        };
        let base_dir = if base_dir.is_absolute() {
            base_dir
        } else {
            std::env::current_dir()?.join(base_dir)
        };
        Ok(Self::from_base(base_dir))
    }
}

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("data file '{}' not found", .0.display())]
    Missing(PathBuf),
    #[error("failed to read data file '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error reading JSON data in '{}': {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Quick-pick values for the type and footprint columns plus the optional
/// document viewer program. Missing keys fall back to empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub types: Vec<String>,
    pub footprints: Vec<String>,
    pub viewer: Option<String>,
}

impl Settings {
    /// Read and parse the data file. A missing or malformed file is an error
    /// the caller is expected to treat as fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_base_directory() {
        let paths = AppPaths::from_base("/srv/labparts");
        assert_eq!(paths.database, Path::new("/srv/labparts/db/components.db"));
        assert_eq!(paths.backup, Path::new("/srv/labparts/db/backup.db"));
        assert_eq!(paths.data_file, Path::new("/srv/labparts/data/data.json"));
    }

    #[test]
    fn loads_suggestion_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{"types": ["Resistor", "Capacitor"], "footprints": ["0603", "0805"]}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.types, vec!["Resistor", "Capacitor"]);
        assert_eq!(settings.footprints, vec!["0603", "0805"]);
        assert_eq!(settings.viewer, None);
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"viewer": "zathura"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(settings.types.is_empty());
        assert!(settings.footprints.is_empty());
        assert_eq!(settings.viewer.as_deref(), Some("zathura"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("data.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{\"types\": [").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
