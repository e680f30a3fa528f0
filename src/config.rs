use crate::analysis::WeightOverrides;
use crate::error::{AppError, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub counters_path: PathBuf,
    pub meta_path: PathBuf,
    pub history_path: PathBuf,
    pub weights_path: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".draft_advisor")
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir = path_var("DRAFT_DATA_DIR").unwrap_or_else(default_data_dir);

        Ok(Config {
            counters_path: path_var("DRAFT_COUNTERS_PATH")
                .unwrap_or_else(|| data_dir.join("counters.json")),
            meta_path: path_var("DRAFT_META_PATH").unwrap_or_else(|| data_dir.join("meta.json")),
            history_path: path_var("DRAFT_HISTORY_PATH")
                .unwrap_or_else(|| data_dir.join("history.json")),
            weights_path: path_var("DRAFT_WEIGHTS_PATH"),
            data_dir,
        })
    }

    /// Weight overrides from `DRAFT_WEIGHTS_PATH`, or none when unset.
    pub fn weight_overrides(&self) -> Result<WeightOverrides> {
        let Some(path) = &self.weights_path else {
            return Ok(WeightOverrides::default());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!(
                "could not read weights file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::ConfigError(format!("invalid weights file {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_weights(path: Option<PathBuf>) -> Config {
        let data_dir = PathBuf::from("/tmp/draft");
        Config {
            counters_path: data_dir.join("counters.json"),
            meta_path: data_dir.join("meta.json"),
            history_path: data_dir.join("history.json"),
            weights_path: path,
            data_dir,
        }
    }

    #[test]
    fn test_no_weights_file_gives_empty_overrides() {
        let overrides = config_with_weights(None).weight_overrides().unwrap();
        assert!(overrides.counter_weight.is_none());
    }

    #[test]
    fn test_weights_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        fs::write(&path, r#"{"good_matchup_bonus": 2.0}"#).unwrap();

        let overrides = config_with_weights(Some(path)).weight_overrides().unwrap();
        assert_eq!(overrides.good_matchup_bonus, Some(2.0));
    }

    #[test]
    fn test_bad_weights_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        fs::write(&path, "not json").unwrap();

        let err = config_with_weights(Some(path)).weight_overrides().unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
