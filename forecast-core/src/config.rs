use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

use crate::{
    client::weatherapi::DEFAULT_BASE_URL,
    location::LocationRequest,
    model::Coordinates,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHERAPI_KEY";

pub const DEFAULT_HORIZON_DAYS: u32 = 10;

/// Location acquisition settings.
///
/// Example TOML:
/// [location]
/// allow = true
/// latitude = 51.52
/// longitude = -0.11
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    /// Whether the user granted access to the device location.
    pub allow: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub interval_ms: u64,
    pub min_update_interval_ms: u64,
    /// Upper bound on waiting for a fix. Unset means wait for as long as the source takes.
    pub fix_timeout_ms: Option<u64>,
    /// Delay between the app becoming visible and the first acquisition attempt.
    pub start_delay_ms: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            allow: None,
            latitude: None,
            longitude: None,
            interval_ms: 10_000,
            min_update_interval_ms: 5_000,
            fix_timeout_ms: None,
            start_delay_ms: 500,
        }
    }
}

impl LocationSettings {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }

    pub fn request(&self) -> LocationRequest {
        LocationRequest {
            interval: Duration::from_millis(self.interval_ms),
            min_update_interval: Duration::from_millis(self.min_update_interval_ms),
            max_updates: 1,
        }
    }

    pub fn fix_timeout(&self) -> Option<Duration> {
        self.fix_timeout_ms.map(Duration::from_millis)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Days of forecast requested per query.
    pub horizon_days: u32,
    pub location: LocationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            location: LocationSettings::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment, falling back to the stored value.
    pub fn api_key(&self) -> Result<String> {
        let from_env = env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        self.resolve_api_key(from_env)
    }

    fn resolve_api_key(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No WeatherAPI key configured.\n\
                     Hint: run `forecast configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.horizon_days, 10);
        assert_eq!(cfg.base_url, "https://api.weatherapi.com");
        assert_eq!(cfg.location.start_delay(), Duration::from_millis(500));
        assert_eq!(cfg.location.fix_timeout(), None);

        let req = cfg.location.request();
        assert_eq!(req.interval, Duration::from_secs(10));
        assert_eq!(req.min_update_interval, Duration::from_secs(5));
        assert_eq!(req.max_updates, 1);
    }

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.resolve_api_key(None).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No WeatherAPI key configured"));
        assert!(msg.contains("Hint: run `forecast configure`"));
    }

    #[test]
    fn blank_stored_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(cfg.resolve_api_key(None).is_err());
    }

    #[test]
    fn environment_key_wins_over_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        assert_eq!(cfg.resolve_api_key(None).unwrap(), "FILE_KEY");
        assert_eq!(cfg.resolve_api_key(Some("ENV_KEY".into())).unwrap(), "ENV_KEY");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "abc"

            [location]
            allow = true
            latitude = 12.34
            longitude = 56.78
            fix_timeout_ms = 15000
            "#,
        )
        .expect("partial config parses");

        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.horizon_days, DEFAULT_HORIZON_DAYS);
        assert_eq!(cfg.location.coordinates(), Some(Coordinates::new(12.34, 56.78)));
        assert_eq!(cfg.location.fix_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.location.min_update_interval_ms, 5_000);
    }

    #[test]
    fn coordinates_need_both_halves() {
        let settings = LocationSettings { latitude: Some(1.0), ..LocationSettings::default() };
        assert_eq!(settings.coordinates(), None);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.horizon_days = 3;
        cfg.location.allow = Some(false);

        cfg.save_to(&path).expect("save succeeds");
        let loaded = Config::load_from(&path).expect("load succeeds");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
