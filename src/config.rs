//! Configuration file handling.
//!
//! The configuration file is optional. It is looked up at the path given with `--config` (or
//! `CLIENT_GRID_CONFIG`), then at `<config dir>/client-grid/config.json`. When neither exists the
//! defaults are used: the demo clients, US currency amounts, `M/D/YYYY` dates and no sort.

use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::AmountFormat;
use crate::render::{check_date_format, Table, DEFAULT_DATE_FORMAT};
use crate::seed::{DemoSeed, FileSeed, SeedSource};
use crate::view::SortRule;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "client-grid";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app: where the seed data comes from
/// and how the grid renders amounts and dates.
#[derive(Debug, Clone, Default)]
pub struct Config {
    config_path: Option<PathBuf>,
    config_file: ConfigFile,
}

impl Config {
    /// Loads the configuration.
    ///
    /// - If `path` is given the file must exist.
    /// - Otherwise the default location is tried, and defaults are used if nothing is there.
    ///
    /// # Errors
    /// - `ErrorType::Config` if the file cannot be read or holds invalid settings.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.is_file() {
                    return Err(Error::msg(
                        ErrorType::Config,
                        format!("The config file is missing '{}'", p.display()),
                    ));
                }
                p.to_path_buf()
            }
            None => match default_path() {
                Some(p) if p.is_file() => p,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let config_file = ConfigFile::load(&path)
            .await
            .pub_result(ErrorType::Config)?;
        debug!("Loaded config from {}", path.display());
        Ok(Self {
            config_path: Some(path),
            config_file,
        })
    }

    /// Writes a config file with default settings to `path`, or to the default location when
    /// `path` is `None`.
    ///
    /// # Errors
    /// - `ErrorType::Config` if a file already exists there or it cannot be written.
    pub async fn create(path: Option<&Path>, seed: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_path().ok_or_else(|| {
                Error::msg(
                    ErrorType::Config,
                    "Unable to determine the config directory, pass --config instead",
                )
            })?,
        };
        let config_file = ConfigFile {
            seed: seed.map(Path::to_path_buf),
            ..ConfigFile::default()
        };
        create_file(&path, &config_file)
            .await
            .pub_result(ErrorType::Config)?;
        Ok(Self {
            config_path: Some(path),
            config_file,
        })
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// The seed file, resolved against the config file's directory if it is relative.
    pub fn seed(&self) -> Option<PathBuf> {
        let seed = self.config_file.seed.as_ref()?;
        if seed.is_absolute() {
            return Some(seed.clone());
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(dir) => Some(dir.join(seed)),
            None => Some(seed.clone()),
        }
    }

    pub fn amount_format(&self) -> AmountFormat {
        self.config_file.amount_format
    }

    pub fn date_format(&self) -> &str {
        &self.config_file.date_format
    }

    pub fn default_sort(&self) -> Option<SortRule> {
        self.config_file.default_sort
    }

    /// The standard grid columns rendered with the configured formats.
    ///
    /// # Errors
    /// - `ErrorType::Validation` if the date format is invalid. A loaded config has already been
    ///   checked, so this only fails for a config built some other way.
    pub fn table(&self) -> Result<Table> {
        Table::standard(self.amount_format(), self.date_format())
    }

    /// The seed source to load: `seed` if given, then the configured seed file, then the demo
    /// clients.
    pub fn seed_source(&self, seed: Option<&Path>) -> Box<dyn SeedSource> {
        match seed.map(Path::to_path_buf).or_else(|| self.seed()) {
            Some(path) => Box::new(FileSeed::new(path)),
            None => Box::new(DemoSeed),
        }
    }
}

/// `<config dir>/client-grid/config.json`, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_JSON))
}

async fn create_file(path: &Path, config_file: &ConfigFile) -> Res<()> {
    if path.exists() {
        bail!("A config file already exists at '{}'", path.display());
    }
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Unable to create directory {}", dir.display()))?;
    }
    config_file.save(path).await
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "client-grid",
///   "config_version": 1,
///   "seed": "clients.csv",
///   "amount_format": { "dollar": true, "commas": true },
///   "date_format": "%-m/%-d/%Y",
///   "default_sort": { "column": "amount", "direction": "desc" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "client-grid"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// A `.json` or `.csv` file to load clients from, relative to config.json or absolute.
    /// The demo clients are used if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed: Option<PathBuf>,

    /// How amounts are rendered.
    #[serde(default)]
    amount_format: AmountFormat,

    /// A chrono `strftime` format for dates.
    #[serde(default = "default_date_format")]
    date_format: String,

    /// The sort applied when the grid opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_sort: Option<SortRule>,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            seed: None,
            amount_format: AmountFormat::default(),
            date_format: default_date_format(),
            default_sort: None,
        }
    }
}

impl ConfigFile {
    /// Loads and validates a ConfigFile.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or holds invalid settings.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        config
            .validate()
            .with_context(|| format!("Invalid config file at {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Res<()> {
        ensure!(
            self.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            self.app_name
        );
        ensure!(
            self.config_version <= CONFIG_VERSION,
            "Unsupported config_version {}, expected at most {}",
            self.config_version,
            CONFIG_VERSION
        );
        check_date_format(&self.date_format)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use crate::view::Direction;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "client-grid",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = Config::load(Some(&config_path)).await.unwrap();
        assert_eq!(config.date_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(config.amount_format(), AmountFormat::default());
        assert_eq!(config.seed(), None);
        assert_eq!(config.default_sort(), None);
        assert_eq!(config.seed_source(None).describe(), "the demo clients");
    }

    #[tokio::test]
    async fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "client-grid",
            "config_version": 1,
            "seed": "clients.csv",
            "amount_format": { "dollar": false, "commas": true },
            "date_format": "%Y-%m-%d",
            "default_sort": { "column": "amount", "direction": "desc" }
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = Config::load(Some(&config_path)).await.unwrap();
        assert_eq!(config.seed(), Some(temp_dir.path().join("clients.csv")));
        assert_eq!(config.amount_format(), AmountFormat::new(false, true));
        assert_eq!(
            config.default_sort(),
            Some(SortRule::new(Column::Amount, Direction::Desc))
        );
        let other = temp_dir.path().join("other.json");
        assert_eq!(config.seed_source(Some(&other)).describe(), other.display().to_string());
    }

    #[tokio::test]
    async fn test_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "wrong_app", "config_version": 1 }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = Config::load(Some(&config_path)).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_load_invalid_date_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "client-grid", "config_version": 1, "date_format": "%Q" }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = Config::load(Some(&config_path)).await.unwrap_err();
        assert!(err.to_string().contains("Invalid date_format"));
    }

    #[tokio::test]
    async fn test_load_missing_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::load(Some(&temp_dir.path().join("nope.json")))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");
        let created = Config::create(Some(&config_path), Some(Path::new("/data/clients.json")))
            .await
            .unwrap();
        assert_eq!(created.seed(), Some(PathBuf::from("/data/clients.json")));

        let loaded = Config::load(Some(&config_path)).await.unwrap();
        assert_eq!(loaded.config_file, created.config_file);

        let err = Config::create(Some(&config_path), None).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("seed"));
        assert!(!json.contains("default_sort"));
    }
}
