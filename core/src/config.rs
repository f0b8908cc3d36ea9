//! User settings and database path resolution.
//!
//! Settings are an optional YAML file, by default
//! `$HOME/.config/ks/config.yaml`. Every key may be omitted.
//!
//! # Example YAML
//!
//! ```yaml
//! database: /srv/archive/documents.ksdb
//! no_header: false
//! underline_header: true
//! ```

use std::ffi::OsString;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// File name of the database under `$HOME` when nothing else is configured.
pub const DEFAULT_DATABASE_NAME: &str = ".ksdb";

/// Settings read from the YAML settings file.
///
/// # Examples
///
/// ```
/// # use ks_core::Settings;
/// let settings: Settings = serde_yaml::from_str("no_header: true").unwrap();
/// assert!(settings.no_header);
/// assert!(settings.underline_header);
/// assert!(settings.database.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Database file used when no `--database` flag or `KS_DATABASE` is given.
    pub database: Option<PathBuf>,
    /// Suppress listing headers by default.
    pub no_header: bool,
    /// Underline the listing header with terminal escapes.
    pub underline_header: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            no_header: false,
            underline_header: true,
        }
    }
}

impl Settings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](CoreError::IoError) if the file cannot be read, or
    /// [`YamlError`](CoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let settings = serde_yaml::from_reader(reader)?;
        Ok(settings)
    }

    /// Loads settings from `path`, or returns defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

/// Returns the current user's home directory from `$HOME`.
///
/// # Errors
///
/// Returns [`CoreError::HomeNotFound`] if `$HOME` is unset or empty.
pub fn home_dir() -> Result<PathBuf> {
    home_from(std::env::var_os("HOME"))
}

fn home_from(value: Option<OsString>) -> Result<PathBuf> {
    match value {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => Err(CoreError::HomeNotFound),
    }
}

/// `$HOME/.ksdb`
pub fn default_database_path(home: &Path) -> PathBuf {
    home.join(DEFAULT_DATABASE_NAME)
}

/// `$HOME/.config/ks/config.yaml`
pub fn default_settings_path(home: &Path) -> PathBuf {
    home.join(".config").join("ks").join("config.yaml")
}

/// Picks the database path: an explicit path (flag or environment) wins,
/// then the settings file, then the default under the home directory.
///
/// `home` is only consulted when it is needed.
pub fn resolve_database(
    explicit: Option<&Path>,
    settings: &Settings,
    home: impl FnOnce() -> Result<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &settings.database {
        return Ok(path.clone());
    }
    Ok(default_database_path(&home()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_home() -> Result<PathBuf> {
        Err(CoreError::HomeNotFound)
    }

    #[test]
    fn test_deserialize_complete() {
        let yaml = r#"
database: /tmp/docs.ksdb
no_header: true
underline_header: false
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.database, Some(PathBuf::from("/tmp/docs.ksdb")));
        assert!(settings.no_header);
        assert!(!settings.underline_header);
    }

    #[test]
    fn test_deserialize_empty_mapping_uses_defaults() {
        let settings: Settings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        let result: std::result::Result<Settings, _> = serde_yaml::from_str("no_header: maybe");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "database: /data/archive.ksdb\nunderline_header: false\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(
            settings,
            Settings {
                database: Some(PathBuf::from("/data/archive.ksdb")),
                no_header: false,
                underline_header: false,
            }
        );
    }

    #[test]
    fn test_load_or_default_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "no_header: [oops").unwrap();
        let err = Settings::load_or_default(&path).unwrap_err();
        assert!(matches!(err, CoreError::YamlError(_)));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, CoreError::IoError(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_home_from() {
        assert_eq!(
            home_from(Some(OsString::from("/home/ana"))).unwrap(),
            PathBuf::from("/home/ana")
        );
        assert!(matches!(home_from(None), Err(CoreError::HomeNotFound)));
        assert!(matches!(
            home_from(Some(OsString::new())),
            Err(CoreError::HomeNotFound)
        ));
    }

    #[test]
    fn test_default_paths() {
        let home = Path::new("/home/ana");
        assert_eq!(default_database_path(home), PathBuf::from("/home/ana/.ksdb"));
        assert_eq!(
            default_settings_path(home),
            PathBuf::from("/home/ana/.config/ks/config.yaml")
        );
    }

    #[test]
    fn test_resolve_database_precedence() {
        let settings = Settings {
            database: Some(PathBuf::from("/from/settings")),
            ..Settings::default()
        };

        let explicit = resolve_database(Some(Path::new("/from/flag")), &settings, no_home);
        assert_eq!(explicit.unwrap(), PathBuf::from("/from/flag"));

        let configured = resolve_database(None, &settings, no_home);
        assert_eq!(configured.unwrap(), PathBuf::from("/from/settings"));

        let fallback = resolve_database(None, &Settings::default(), || {
            Ok(PathBuf::from("/home/ana"))
        });
        assert_eq!(fallback.unwrap(), PathBuf::from("/home/ana/.ksdb"));
    }

    #[test]
    fn test_resolve_database_without_home() {
        let err = resolve_database(None, &Settings::default(), no_home).unwrap_err();
        assert!(matches!(err, CoreError::HomeNotFound));
    }
}
