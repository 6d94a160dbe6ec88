// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

pub const API_KEY_ENV: &str = "ENIGMA_API_KEY";

/// Key baked in when the binary was built with `ENIGMA_API_KEY` set.
const BUILD_TIME_API_KEY: Option<&str> = option_env!("ENIGMA_API_KEY");

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("enigma");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = get_config_dir()?.join("logs");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
    Ok(log_dir)
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

/// Read the config at `path`, writing the defaults there first if it is missing.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_config = AppConfig::default();
        save_config_to(path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, contents).context("Failed to write config file")?;

    Ok(())
}

/// Environment first, then the config file, then the build-time key.
pub fn resolve_api_key(
    config: &AppConfig,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let usable = |key: &String| !key.trim().is_empty();

    env_lookup(API_KEY_ENV)
        .filter(usable)
        .or_else(|| config.api_key.clone().filter(usable))
        .or_else(|| BUILD_TIME_API_KEY.map(ToString::to_string).filter(usable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.model, "gemini-1.5-flash-latest");
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = AppConfig {
            api_base_url: "http://custom:8080/v1".to_string(),
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        save_config_to(&path, &config).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, "http://custom:8080/v1");
        assert_eq!(loaded.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_config_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "model = [unterminated").unwrap();

        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_env_key_wins_over_config() {
        let config = AppConfig {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        let key = resolve_api_key(&config, |name| {
            (name == API_KEY_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_config_key_used_without_env() {
        let config = AppConfig {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_key(&config, |_| None).as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn test_blank_env_key_falls_through_to_file() {
        let config = AppConfig {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_key(&config, |_| Some(String::new())),
            Some("from-file".to_string())
        );
        assert_eq!(
            resolve_api_key(&config, |_| Some("  ".to_string())),
            Some("from-file".to_string())
        );
    }

    #[test]
    fn test_blank_keys_everywhere_fall_through_to_build_time() {
        let config = AppConfig {
            api_key: Some(" ".to_string()),
            ..Default::default()
        };
        let expected = BUILD_TIME_API_KEY
            .filter(|key| !key.trim().is_empty())
            .map(ToString::to_string);
        assert_eq!(resolve_api_key(&config, |_| Some(String::new())), expected);
    }
}
