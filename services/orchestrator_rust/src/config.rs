use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug)]
pub struct Config {
    pub sports_config_path: PathBuf,
    pub events_path: PathBuf,
    pub api_games_path: Option<PathBuf>,
    pub diagnostics_dir: PathBuf,
    pub log_level: String,
    /// Date folders older than this many days are removed at startup
    pub log_retention_days: u32,
    pub cleanup_on_startup: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = var("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            bail!(
                "LOG_LEVEL must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                log_level
            );
        }

        let log_retention_days: u32 = var("LOG_RETENTION_DAYS")
            .unwrap_or_else(|| "14".to_string())
            .parse()
            .context("LOG_RETENTION_DAYS must be a whole number of days")?;
        let cleanup_on_startup: bool = var("CLEANUP_ON_STARTUP")
            .unwrap_or_else(|| "true".to_string())
            .to_lowercase()
            .parse()
            .context("CLEANUP_ON_STARTUP must be true or false")?;

        Ok(Self {
            sports_config_path: var("SPORTS_CONFIG_PATH")
                .unwrap_or_else(|| "config/sports/sports_config.json".to_string())
                .into(),
            events_path: var("EVENTS_PATH")
                .unwrap_or_else(|| "input/events.json".to_string())
                .into(),
            api_games_path: var("API_GAMES_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            diagnostics_dir: var("DIAGNOSTICS_DIR")
                .unwrap_or_else(|| "logs".to_string())
                .into(),
            log_level,
            log_retention_days,
            cleanup_on_startup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.sports_config_path,
            PathBuf::from("config/sports/sports_config.json")
        );
        assert_eq!(config.events_path, PathBuf::from("input/events.json"));
        assert!(config.api_games_path.is_none());
        assert_eq!(config.diagnostics_dir, PathBuf::from("logs"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_retention_days, 14);
        assert!(config.cleanup_on_startup);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("API_GAMES_PATH", "input/api.json"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_RETENTION_DAYS", "3"),
            ("CLEANUP_ON_STARTUP", "False"),
        ])
        .unwrap();
        assert_eq!(config.log_retention_days, 3);
        assert!(!config.cleanup_on_startup);
        assert_eq!(config.api_games_path, Some(PathBuf::from("input/api.json")));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_log_level() {
        let err = config_from(&[("LOG_LEVEL", "loud")]).unwrap_err();
        assert!(err.to_string().contains("LOG_LEVEL"));
    }

    #[test]
    fn test_invalid_retention() {
        let err = config_from(&[("LOG_RETENTION_DAYS", "two weeks")]).unwrap_err();
        assert!(err.to_string().contains("LOG_RETENTION_DAYS"));
        let err = config_from(&[("CLEANUP_ON_STARTUP", "sometimes")]).unwrap_err();
        assert!(err.to_string().contains("CLEANUP_ON_STARTUP"));
    }
}
