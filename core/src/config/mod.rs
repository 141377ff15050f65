use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const TRIPWISE_DIR: &str = ".tripwise";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: crate::tools::search::MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub lang: String,
    /// Prefixes the engine tends to put in front of the city name.
    pub strip_labels: Vec<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            lang: "en".to_string(),
            strip_labels: vec!["City:".to_string(), "Ville:".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub max_iterations: usize,
    pub temperature: f64,
    pub day_markers: Vec<String>,
    pub search: SearchConfig,
    pub weather: WeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            max_iterations: 15,
            temperature: 0.0,
            day_markers: vec!["Day".to_string(), "Jour".to_string()],
            search: SearchConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

pub fn get_tripwise_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(TRIPWISE_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_tripwise_dir().join("config.toml")
}

pub fn get_history_path() -> PathBuf {
    get_tripwise_dir().join("history.txt")
}

pub fn ensure_tripwise_dir() -> Result<PathBuf> {
    let dir = get_tripwise_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create tripwise directory at {}", dir.display()))?;
    }

    Ok(dir)
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path())
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'tripwise onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_tripwise_dir()?;
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let config = Config {
            provider: Some("ollama".to_string()),
            model: "llama3.2".to_string(),
            max_iterations: 7,
            ..Default::default()
        };
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.provider.as_deref(), Some("ollama"));
        assert_eq!(loaded.model, "llama3.2");
        assert_eq!(loaded.max_iterations, 7);
        assert_eq!(loaded.weather, WeatherConfig::default());
    }

    #[test]
    fn partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "model = \"gpt-4o\"\nday_markers = [\"Day\", \"Tag\"]\n\n[search]\napi_key = \"tvly-123\"\n",
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.model, "gpt-4o");
        assert_eq!(loaded.day_markers, vec!["Day", "Tag"]);
        assert_eq!(loaded.search.api_key, "tvly-123");
        assert_eq!(loaded.search.max_results, 3);
        assert_eq!(loaded.max_iterations, 15);
    }

    #[test]
    fn missing_file_points_to_onboarding() {
        let tmp = TempDir::new().unwrap();
        let err = load_config_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("tripwise onboard"));
    }
}
