use anyhow::{Context, Result};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::request::{MAX_AGE, MIN_AGE};
use crate::core::{CustomerType, Gender, IncomeLevel, Layout, Orientation};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(skip)]
    pub config_path: PathBuf,

    /// Key from the environment, never written back to the file
    #[serde(skip)]
    pub env_api_key: Option<String>,

    /// Key passed with --api-key for this run
    #[serde(skip)]
    pub flag_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Form defaults used when a flag is not given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub income: IncomeLevel,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default = "default_age")]
    pub age: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
    /// Run the image generation stage after the chat stage
    #[serde(default)]
    pub render_image: bool,
    #[serde(default = "default_true")]
    pub download_image: bool,
    #[serde(default = "default_display")]
    pub display: DisplayMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Terminal,
    None,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Terminal => "terminal",
            DisplayMode::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terminal" => Some(DisplayMode::Terminal),
            "none" => Some(DisplayMode::None),
            _ => None,
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["terminal", "none"]
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_age() -> u8 {
    30
}

fn default_output_directory() -> String {
    "./adprompt-output".to_string()
}

fn default_true() -> bool {
    true
}

fn default_display() -> DisplayMode {
    DisplayMode::Terminal
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            layout: Layout::default(),
            gender: Gender::default(),
            income: IncomeLevel::default(),
            customer_type: CustomerType::default(),
            age: default_age(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            render_image: false,
            download_image: true,
            display: DisplayMode::Terminal,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            defaults: DefaultsConfig::default(),
            output: OutputConfig::default(),
            config_path: PathBuf::new(),
            env_api_key: None,
            flag_api_key: None,
        }
    }
}

/// Parse a CLI-style enum value, listing the valid ones on failure
fn parse_choice<T: ValueEnum>(key: &str, value: &str) -> Result<T> {
    T::from_str(value, true).map_err(|_| {
        let valid: Vec<String> = T::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        anyhow::anyhow!("Invalid value for {}. Valid values: {}", key, valid.join(", "))
    })
}

fn choice_name<T: ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "adprompt", "adprompt-cli")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from file or create default
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;
        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::load_or_create_at(config_path, env_key)
    }

    /// Load config from a specific path. An environment key takes precedence over the file.
    pub fn load_or_create_at(config_path: PathBuf, env_key: Option<String>) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let mut config: Config = toml::from_str(&content)
                .context("Failed to parse config file")?;
            config.config_path = config_path;
            config
        } else {
            let mut config = Config::default();
            config.config_path = config_path;
            config.save()?;
            config
        };

        config.env_api_key = env_key.filter(|k| !k.is_empty());

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get API key: flag first, then environment, then config file
    pub fn api_key(&self) -> Option<&str> {
        self.flag_api_key
            .as_deref()
            .or(self.env_api_key.as_deref())
            .or(self.api.key.as_deref())
    }

    /// Use a key supplied on the command line for this run only
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            self.flag_api_key = Some(key);
        }
    }

    /// Set a config value by key path (e.g., "api.key", "defaults.orientation")
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.key" => self.api.key = Some(value.to_string()),
            "api.base_url" => self.api.base_url = value.to_string(),
            "api.chat_model" => self.api.chat_model = value.to_string(),
            "api.image_model" => self.api.image_model = value.to_string(),
            "api.temperature" => {
                let temperature: f32 = value.parse()
                    .context("Invalid temperature")?;
                if !(0.0..=2.0).contains(&temperature) {
                    anyhow::bail!("Temperature must be between 0.0 and 2.0");
                }
                self.api.temperature = temperature;
            }
            "defaults.orientation" => self.defaults.orientation = parse_choice(key, value)?,
            "defaults.layout" => self.defaults.layout = parse_choice(key, value)?,
            "defaults.gender" => self.defaults.gender = parse_choice(key, value)?,
            "defaults.income" => self.defaults.income = parse_choice(key, value)?,
            "defaults.customer_type" => self.defaults.customer_type = parse_choice(key, value)?,
            "defaults.age" => {
                let age: u8 = value.parse()
                    .context("Invalid age")?;
                if !(MIN_AGE..=MAX_AGE).contains(&age) {
                    anyhow::bail!("Age must be between {} and {}", MIN_AGE, MAX_AGE);
                }
                self.defaults.age = age;
            }
            "output.directory" => self.output.directory = value.to_string(),
            "output.render_image" => {
                self.output.render_image = value.parse()
                    .context("Invalid boolean value")?;
            }
            "output.download_image" => {
                self.output.download_image = value.parse()
                    .context("Invalid boolean value")?;
            }
            "output.display" => {
                self.output.display = DisplayMode::parse(value).with_context(|| {
                    format!("Invalid display mode. Valid values: {}", DisplayMode::variants().join(", "))
                })?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value by key path
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.key" => self.api_key().map(|_| "****".to_string()), // Mask API key
            "api.base_url" => Some(self.api.base_url.clone()),
            "api.chat_model" => Some(self.api.chat_model.clone()),
            "api.image_model" => Some(self.api.image_model.clone()),
            "api.temperature" => Some(self.api.temperature.to_string()),
            "defaults.orientation" => Some(choice_name(&self.defaults.orientation)),
            "defaults.layout" => Some(choice_name(&self.defaults.layout)),
            "defaults.gender" => Some(choice_name(&self.defaults.gender)),
            "defaults.income" => Some(choice_name(&self.defaults.income)),
            "defaults.customer_type" => Some(choice_name(&self.defaults.customer_type)),
            "defaults.age" => Some(self.defaults.age.to_string()),
            "output.directory" => Some(self.output.directory.clone()),
            "output.render_image" => Some(self.output.render_image.to_string()),
            "output.download_image" => Some(self.output.download_image.to_string()),
            "output.display" => Some(self.output.display.as_str().to_string()),
            _ => None,
        }
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "api.key",
            "api.base_url",
            "api.chat_model",
            "api.image_model",
            "api.temperature",
            "defaults.orientation",
            "defaults.layout",
            "defaults.gender",
            "defaults.income",
            "defaults.customer_type",
            "defaults.age",
            "output.directory",
            "output.render_image",
            "output.download_image",
            "output.display",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_form() {
        let config = Config::default();
        assert_eq!(config.api.chat_model, "gpt-4o");
        assert_eq!(config.api.image_model, "dall-e-3");
        assert!((config.api.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.defaults.age, 30);
        assert_eq!(config.defaults.income, IncomeLevel::Medium);
        assert!(!config.output.render_image);
    }

    #[test]
    fn set_validates_enum_values() {
        let mut config = Config::default();
        config.set("defaults.layout", "four-grid").unwrap();
        assert_eq!(config.defaults.layout, Layout::FourGrid);
        assert_eq!(config.get("defaults.layout").as_deref(), Some("four-grid"));

        let err = config.set("defaults.orientation", "diagonal").unwrap_err();
        assert!(err.to_string().contains("landscape, portrait"));
    }

    #[test]
    fn set_rejects_out_of_range_numbers() {
        let mut config = Config::default();
        assert!(config.set("defaults.age", "5").is_err());
        assert!(config.set("api.temperature", "3.5").is_err());
        config.set("api.temperature", "0.2").unwrap();
        assert_eq!(config.get("api.temperature").as_deref(), Some("0.2"));
    }

    #[test]
    fn unknown_keys_are_errors() {
        let mut config = Config::default();
        assert!(config.set("api.model", "x").is_err());
        assert!(config.get("nope").is_none());
        for key in Config::keys() {
            if *key != "api.key" {
                assert!(config.get(key).is_some(), "no getter for {}", key);
            }
        }
    }

    #[test]
    fn api_key_is_masked() {
        let mut config = Config::default();
        config.set("api.key", "sk-secret").unwrap();
        assert_eq!(config.get("api.key").as_deref(), Some("****"));
        assert_eq!(config.api_key(), Some("sk-secret"));
    }

    #[test]
    fn env_key_wins_but_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_or_create_at(path.clone(), Some("sk-env".to_string())).unwrap();
        assert_eq!(config.api_key(), Some("sk-env"));
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("sk-env"));
    }

    #[test]
    fn env_key_survives_set_and_save_without_reaching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config =
            Config::load_or_create_at(path.clone(), Some("sk-env-secret".to_string())).unwrap();
        config.set("defaults.age", "40").unwrap();
        config.save().unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("sk-env-secret"), "env key written to:\n{}", on_disk);
        assert_eq!(config.api_key(), Some("sk-env-secret"));

        let reloaded = Config::load_or_create_at(path, None).unwrap();
        assert_eq!(reloaded.defaults.age, 40);
        assert!(reloaded.api_key().is_none());
    }

    #[test]
    fn file_key_is_kept_when_env_key_is_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_or_create_at(path.clone(), None).unwrap();
        config.set("api.key", "sk-file").unwrap();
        config.save().unwrap();

        let mut config = Config::load_or_create_at(path.clone(), Some("sk-env".to_string())).unwrap();
        assert_eq!(config.api_key(), Some("sk-env"));
        config.set("defaults.layout", "split").unwrap();
        config.save().unwrap();

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("sk-file"));
        assert!(!on_disk.contains("sk-env"));
    }

    #[test]
    fn saved_values_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::load_or_create_at(path.clone(), None).unwrap();
        config.set("defaults.orientation", "portrait").unwrap();
        config.set("output.render_image", "true").unwrap();
        config.save().unwrap();

        let reloaded = Config::load_or_create_at(path, None).unwrap();
        assert_eq!(reloaded.defaults.orientation, Orientation::Portrait);
        assert!(reloaded.output.render_image);
        assert!(reloaded.api_key().is_none());
    }

    #[test]
    fn flag_key_overrides_env_and_config() {
        let mut config = Config::default();
        config.api.key = Some("sk-file".to_string());
        config.override_api_key(None);
        assert_eq!(config.api_key(), Some("sk-file"));

        config.env_api_key = Some("sk-env".to_string());
        assert_eq!(config.api_key(), Some("sk-env"));

        config.override_api_key(Some("sk-flag".to_string()));
        assert_eq!(config.api_key(), Some("sk-flag"));
        assert_eq!(config.api.key.as_deref(), Some("sk-file"));
    }
}
