use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::credentials::{CredentialKey, CredentialSource};
use crate::error::WeatherSmsError;

pub const DEFAULT_POSTAL_CODE: &str = "10977";
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// Rain narrative settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub enabled: bool,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self { enabled: true, model: "gpt-4o-mini".to_string(), max_tokens: 120 }
    }
}

/// Base URLs of the upstream providers. Overridden in tests and for proxies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openweather: String,
    pub openai: String,
    pub twilio: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org".to_string(),
            openai: "https://api.openai.com".to_string(),
            twilio: "https://api.twilio.com".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// postal_code = "10977"
/// recipients = ["+18455550100"]
///
/// [narrative]
/// enabled = true
///
/// [credentials]
/// OPENWEATHER_API_KEY = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub postal_code: String,
    pub country_code: String,
    pub recipients: Vec<String>,
    pub narrative: NarrativeConfig,
    pub endpoints: Endpoints,

    /// Fallback credential store, keyed by environment variable name.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub credentials: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            postal_code: DEFAULT_POSTAL_CODE.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            recipients: Vec::new(),
            narrative: NarrativeConfig::default(),
            endpoints: Endpoints::default(),
            credentials: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config, creating parent directories as needed.
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
        let dirs = ProjectDirs::from("dev", "weather-sms", "weather-sms")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check the settings every run needs before any network call is made.
    pub fn validate(&self) -> Result<(), WeatherSmsError> {
        if self.postal_code.trim().is_empty() {
            return Err(WeatherSmsError::config("No postal code configured"));
        }
        if self.recipients.iter().all(|r| r.trim().is_empty()) {
            return Err(WeatherSmsError::config(
                "No recipients configured.\n\
                 Hint: run `weather-sms configure` or pass `--recipient <number>`.",
            ));
        }
        Ok(())
    }

    /// Add a recipient unless it is already present.
    pub fn add_recipient(&mut self, number: impl Into<String>) {
        let number = number.into().trim().to_string();
        if !number.is_empty() && !self.recipients.contains(&number) {
            self.recipients.push(number);
        }
    }

    /// `zip` query value, e.g. `10977,US`.
    pub fn zip_query(&self) -> String {
        format!("{},{}", self.postal_code.trim(), self.country_code.trim())
    }
}

impl CredentialSource for Config {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.credentials.get(key.env_var()).filter(|v| !v.trim().is_empty()).cloned()
    }
}
