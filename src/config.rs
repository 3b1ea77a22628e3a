use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.yml";
pub const DEFAULT_DAYS_TO_SYNC: u32 = 30;
const APP_DIR: &str = "intervals-dedup";

pub const API_KEY_ENV: &str = "INTERVALS_API_KEY";
pub const ATHLETE_ID_ENV: &str = "INTERVALS_ATHLETE_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found; create it from config.example.yml", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("API key or athlete ID missing from config and environment")]
    MissingCredentials,
}

/// How much each quality signal is worth when scoring a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub gps: f64,
    #[serde(rename = "heartrate")]
    pub heart_rate: f64,
    pub power: f64,
    pub cadence: f64,
    pub sampling_rate: f64,
    /// Bonus for a perceived-effort or feel rating
    pub rpe: f64,
    /// Bonus for notes/description
    pub manual: f64,
    /// Bonus for a non-generic title
    pub custom_name: f64,
}

/// Everything the scoring engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    /// Preferred devices/sensors, best first
    pub device_priority: Vec<String>,
    /// Uploader name substring -> score deduction
    pub uploader_penalties: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub athlete_id: String,
    #[serde(default)]
    pub days_to_sync: u32,
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    #[serde(flatten)]
    pub scoring: ScoringConfig,
}

impl Config {
    /// Read `path`, apply environment overrides and check credentials.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse `path` as-is; credentials may be missing.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Replace credentials with non-empty values from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.api_key = key;
        }
        if let Some(id) = lookup(ATHLETE_ID_ENV).filter(|v| !v.is_empty()) {
            self.athlete_id = id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() || self.athlete_id.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }

    pub fn days_to_sync(&self) -> u32 {
        if self.days_to_sync == 0 {
            DEFAULT_DAYS_TO_SYNC
        } else {
            self.days_to_sync
        }
    }

    /// Where applied actions are recorded.
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join("history.jsonl"))
            .unwrap_or_else(|| PathBuf::from(".intervals-dedup-history.jsonl"))
    }
}

/// Pick the config file: an explicit path, else `config.yml` in the working
/// directory, else the one in the user config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
api_key: "secret"
athlete_id: "i12345"
days_to_sync: 14
weights:
  gps: 10
  heartrate: 8
  power: 20
  cadence: 3
  sampling_rate: 5
  rpe: 2
  manual: 2
  custom_name: 4
device_priority:
  - Wahoo
  - Garmin
uploader_penalties:
  RunGap: 15
  HealthFit: 7.5
"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.athlete_id, "i12345");
        assert_eq!(config.days_to_sync(), 14);
        assert_eq!(config.scoring.weights.heart_rate, 8.0);
        assert_eq!(config.scoring.weights.power, 20.0);
        assert_eq!(config.scoring.device_priority, vec!["Wahoo", "Garmin"]);
        assert_eq!(config.scoring.uploader_penalties["HealthFit"], 7.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(include_str!("../config.example.yml")).unwrap();

        assert_eq!(config.days_to_sync(), 30);
        assert_eq!(config.scoring.device_priority[0], "Wahoo");
        assert_eq!(config.scoring.uploader_penalties["RunGap"], 20.0);
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_optional_sections_default() {
        let config = Config::from_yaml("api_key: k\nathlete_id: a\n").unwrap();

        assert_eq!(config.days_to_sync(), DEFAULT_DAYS_TO_SYNC);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!(config.history_file.is_none());
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = Config::from_yaml("api_key: from-file\n").unwrap();
        config.apply_overrides(|key| match key {
            API_KEY_ENV => Some("from-env".to_string()),
            ATHLETE_ID_ENV => Some("i999".to_string()),
            _ => None,
        });

        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.athlete_id, "i999");
    }

    #[test]
    fn test_empty_env_does_not_clear_file_value() {
        let mut config = Config::from_yaml("api_key: from-file\n").unwrap();
        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config.api_key, "from-file");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = Config::from_yaml("athlete_id: i1\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.yml");
        assert!(matches!(Config::load(&path), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, "weights: [not, a, map]\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_read_without_credentials_keeps_history_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        fs::write(&path, "history_file: /var/lib/dedup/history.jsonl\n").unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(
            config.history_path(),
            PathBuf::from("/var/lib/dedup/history.jsonl")
        );
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.yml");
        assert!(matches!(Config::read(&path), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_history_path_override() {
        let config = Config {
            history_file: Some(PathBuf::from("/tmp/dedup.jsonl")),
            ..Default::default()
        };
        assert_eq!(config.history_path(), PathBuf::from("/tmp/dedup.jsonl"));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = Path::new("/etc/custom.yml");
        assert_eq!(resolve_config_path(Some(path)), path.to_path_buf());
    }
}
