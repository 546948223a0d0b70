use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::{
    city::CityDirectory,
    provider::openweather::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL},
};

/// Rio de Janeiro, Beijing and Los Angeles.
const DEFAULT_FEATURED: [u64; 3] = [3451190, 1816670, 5368361];

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:3000".to_string() }
    }
}

/// Forecast provider settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    /// Environment variable consulted for the API key on every request.
    pub api_key_env: String,

    /// Used when the environment variable is unset or empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub base_url: String,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for OpenWeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherConfig")
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_city_id = 3451190
/// featured_city_ids = [3451190, 1816670, 5368361]
///
/// [server]
/// bind = "0.0.0.0:8080"
///
/// [openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// City shown when the home page is opened without a search.
    pub default_city_id: u64,

    /// Cities linked from the navigation bar, in display order.
    pub featured_city_ids: Vec<u64>,

    /// JSON city table to use instead of the embedded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities_file: Option<PathBuf>,

    pub server: ServerConfig,
    pub openweather: OpenWeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city_id: DEFAULT_FEATURED[0],
            featured_city_ids: DEFAULT_FEATURED.to_vec(),
            cities_file: None,
            server: ServerConfig::default(),
            openweather: OpenWeatherConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Store the fallback OpenWeather API key.
    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    pub fn has_api_key(&self) -> bool {
        self.openweather.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Build the city directory from `cities_file`, or the embedded table.
    pub fn load_directory(&self) -> Result<CityDirectory> {
        match &self.cities_file {
            Some(path) => CityDirectory::from_path(path),
            None => CityDirectory::embedded(),
        }
    }
}
